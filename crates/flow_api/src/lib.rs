use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{
    domain::{ComponentId, ControllerServiceId, Position},
    error::ApiError,
    protocol::{
        ControllerServiceRunStatusRequest, ControllerServicesResponse, ControllerStatus,
        CopyBuffer, CopyRequest, CreateProcessGroupRequest, CreateProcessorRequest, FlowListing,
        FlowStatusResponse, NewProcessGroup, NewProcessor, ParameterContextReference,
        PasteRequest, ProcessGroupEntity, ProcessGroupFlowResponse, ProcessorEntity,
        ProcessorSpec, Revision, ScheduleComponentsRequest, ScheduledState,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowStatus {
    pub controller: ControllerStatus,
    pub fetched_at: DateTime<Utc>,
}

/// Remote operations the workspace issues against the flow server.
#[async_trait]
pub trait FlowApi: Send + Sync {
    async fn authenticate(&self) -> Result<()>;
    async fn get_flow_status(&self) -> Result<FlowStatus>;
    async fn get_root_process_group_id(&self) -> Result<ComponentId>;
    async fn fetch_flow_process_groups(
        &self,
        parent_group_id: &ComponentId,
        ui_only: bool,
    ) -> Result<FlowListing>;
    async fn create_process_group(
        &self,
        parent_group_id: &ComponentId,
        name: &str,
        parameter_context: Option<&str>,
        position: Position,
    ) -> Result<ProcessGroupEntity>;
    async fn set_process_group_state(
        &self,
        id: &ComponentId,
        state: ScheduledState,
    ) -> Result<ProcessGroupEntity>;
    async fn copy_process_group(
        &self,
        parent_group_id: &ComponentId,
        ids: &[ComponentId],
    ) -> Result<CopyBuffer>;
    async fn paste_process_group(
        &self,
        parent_group_id: &ComponentId,
        buffer: &CopyBuffer,
    ) -> Result<serde_json::Value>;
    async fn delete_process_group(&self, id: &ComponentId) -> Result<()>;
    async fn create_processor(
        &self,
        parent_group_id: &ComponentId,
        spec: &ProcessorSpec,
        position: Position,
    ) -> Result<ProcessorEntity>;
    async fn get_controller_services(&self) -> Result<ControllerServicesResponse>;
    async fn set_controller_service_state(
        &self,
        id: &ControllerServiceId,
        enabled: bool,
    ) -> Result<()>;
    async fn delete_controller_service(&self, id: &ControllerServiceId) -> Result<()>;

    async fn start_process_group(&self, id: &ComponentId) -> Result<ProcessGroupEntity> {
        self.set_process_group_state(id, ScheduledState::Running)
            .await
    }

    async fn stop_process_group(&self, id: &ComponentId) -> Result<ProcessGroupEntity> {
        self.set_process_group_state(id, ScheduledState::Stopped)
            .await
    }

    async fn enable_process_group(&self, id: &ComponentId) -> Result<ProcessGroupEntity> {
        self.set_process_group_state(id, ScheduledState::Enabled)
            .await
    }

    async fn disable_process_group(&self, id: &ComponentId) -> Result<ProcessGroupEntity> {
        self.set_process_group_state(id, ScheduledState::Disabled)
            .await
    }
}

pub struct MissingFlowApi;

fn unavailable<T>() -> Result<T> {
    Err(anyhow!("flow api backend is unavailable"))
}

#[async_trait]
impl FlowApi for MissingFlowApi {
    async fn authenticate(&self) -> Result<()> {
        unavailable()
    }

    async fn get_flow_status(&self) -> Result<FlowStatus> {
        unavailable()
    }

    async fn get_root_process_group_id(&self) -> Result<ComponentId> {
        unavailable()
    }

    async fn fetch_flow_process_groups(
        &self,
        _parent_group_id: &ComponentId,
        _ui_only: bool,
    ) -> Result<FlowListing> {
        unavailable()
    }

    async fn create_process_group(
        &self,
        _parent_group_id: &ComponentId,
        _name: &str,
        _parameter_context: Option<&str>,
        _position: Position,
    ) -> Result<ProcessGroupEntity> {
        unavailable()
    }

    async fn set_process_group_state(
        &self,
        _id: &ComponentId,
        _state: ScheduledState,
    ) -> Result<ProcessGroupEntity> {
        unavailable()
    }

    async fn copy_process_group(
        &self,
        _parent_group_id: &ComponentId,
        _ids: &[ComponentId],
    ) -> Result<CopyBuffer> {
        unavailable()
    }

    async fn paste_process_group(
        &self,
        _parent_group_id: &ComponentId,
        _buffer: &CopyBuffer,
    ) -> Result<serde_json::Value> {
        unavailable()
    }

    async fn delete_process_group(&self, _id: &ComponentId) -> Result<()> {
        unavailable()
    }

    async fn create_processor(
        &self,
        _parent_group_id: &ComponentId,
        _spec: &ProcessorSpec,
        _position: Position,
    ) -> Result<ProcessorEntity> {
        unavailable()
    }

    async fn get_controller_services(&self) -> Result<ControllerServicesResponse> {
        unavailable()
    }

    async fn set_controller_service_state(
        &self,
        _id: &ControllerServiceId,
        _enabled: bool,
    ) -> Result<()> {
        unavailable()
    }

    async fn delete_controller_service(&self, _id: &ControllerServiceId) -> Result<()> {
        unavailable()
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct RevisionEnvelope {
    #[serde(default)]
    revision: Revision,
}

/// [`FlowApi`] over the server's REST endpoints.
pub struct HttpFlowApi {
    http: Client,
    base_url: Url,
    client_id: String,
    credentials: Option<Credentials>,
    token: RwLock<Option<String>>,
}

impl HttpFlowApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .with_context(|| format!("invalid flow api base url '{base_url}'"))?;
        Ok(Self {
            http: Client::new(),
            base_url,
            client_id: Uuid::new_v4().to_string(),
            credentials: None,
            token: RwLock::new(None),
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("invalid flow api path '{path}'"))
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        let builder = self.http.request(method, url);
        let token = self.token.read().await;
        Ok(match token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), body).into())
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .context("failed to decode flow api response")
    }

    async fn current_revision(&self, path: &str) -> Result<Revision> {
        let envelope: RevisionEnvelope = self
            .send_json(self.request(Method::GET, path).await?)
            .await?;
        let mut revision = envelope.revision;
        revision.client_id = Some(self.client_id.clone());
        Ok(revision)
    }

    async fn delete_versioned(&self, path: &str) -> Result<()> {
        let revision = self.current_revision(path).await?;
        let builder = self
            .request(Method::DELETE, path)
            .await?
            .query(&[
                ("version", revision.version.to_string()),
                ("clientId", self.client_id.clone()),
            ]);
        self.send(builder).await?;
        Ok(())
    }
}

#[async_trait]
impl FlowApi for HttpFlowApi {
    async fn authenticate(&self) -> Result<()> {
        let Some(credentials) = &self.credentials else {
            debug!("no credentials configured; using anonymous access");
            return Ok(());
        };
        let builder = self
            .request(Method::POST, "access/token")
            .await?
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ]);
        let token = self
            .send(builder)
            .await?
            .text()
            .await
            .context("failed to read access token")?;
        *self.token.write().await = Some(token.trim().to_string());
        info!(username = %credentials.username, "authenticated against flow api");
        Ok(())
    }

    async fn get_flow_status(&self) -> Result<FlowStatus> {
        let response: FlowStatusResponse = self
            .send_json(self.request(Method::GET, "flow/status").await?)
            .await?;
        Ok(FlowStatus {
            controller: response.controller_status,
            fetched_at: Utc::now(),
        })
    }

    async fn get_root_process_group_id(&self) -> Result<ComponentId> {
        let response: ProcessGroupFlowResponse = self
            .send_json(self.request(Method::GET, "flow/process-groups/root").await?)
            .await?;
        response
            .process_group_flow
            .id
            .map(ComponentId)
            .ok_or_else(|| anyhow!("root process group response carried no id"))
    }

    async fn fetch_flow_process_groups(
        &self,
        parent_group_id: &ComponentId,
        ui_only: bool,
    ) -> Result<FlowListing> {
        let builder = self
            .request(
                Method::GET,
                &format!("flow/process-groups/{parent_group_id}"),
            )
            .await?
            .query(&[("uiOnly", ui_only)]);
        self.send_json(builder).await
    }

    async fn create_process_group(
        &self,
        parent_group_id: &ComponentId,
        name: &str,
        parameter_context: Option<&str>,
        position: Position,
    ) -> Result<ProcessGroupEntity> {
        let body = CreateProcessGroupRequest {
            revision: Revision::initial(&self.client_id),
            component: NewProcessGroup {
                name: name.to_string(),
                position,
                parameter_context: parameter_context.map(|id| ParameterContextReference {
                    id: Some(id.to_string()),
                    component: None,
                }),
            },
        };
        let builder = self
            .request(
                Method::POST,
                &format!("process-groups/{parent_group_id}/process-groups"),
            )
            .await?
            .json(&body);
        self.send_json(builder).await
    }

    async fn set_process_group_state(
        &self,
        id: &ComponentId,
        state: ScheduledState,
    ) -> Result<ProcessGroupEntity> {
        let body = ScheduleComponentsRequest {
            id: id.to_string(),
            state,
            disconnected_node_acknowledged: false,
        };
        let builder = self
            .request(Method::PUT, &format!("flow/process-groups/{id}"))
            .await?
            .json(&body);
        self.send(builder).await?;
        self.send_json(
            self.request(Method::GET, &format!("process-groups/{id}"))
                .await?,
        )
        .await
    }

    async fn copy_process_group(
        &self,
        parent_group_id: &ComponentId,
        ids: &[ComponentId],
    ) -> Result<CopyBuffer> {
        let body = CopyRequest {
            process_groups: ids.iter().map(ToString::to_string).collect(),
        };
        let builder = self
            .request(
                Method::POST,
                &format!("process-groups/{parent_group_id}/copy"),
            )
            .await?
            .json(&body);
        self.send_json(builder).await
    }

    async fn paste_process_group(
        &self,
        parent_group_id: &ComponentId,
        buffer: &CopyBuffer,
    ) -> Result<serde_json::Value> {
        let revision = self
            .current_revision(&format!("process-groups/{parent_group_id}"))
            .await?;
        let body = PasteRequest {
            copy_response: buffer.clone(),
            revision,
        };
        let builder = self
            .request(
                Method::PUT,
                &format!("process-groups/{parent_group_id}/paste"),
            )
            .await?
            .json(&body);
        self.send_json(builder).await
    }

    async fn delete_process_group(&self, id: &ComponentId) -> Result<()> {
        self.delete_versioned(&format!("process-groups/{id}")).await
    }

    async fn create_processor(
        &self,
        parent_group_id: &ComponentId,
        spec: &ProcessorSpec,
        position: Position,
    ) -> Result<ProcessorEntity> {
        let body = CreateProcessorRequest {
            revision: Revision::initial(&self.client_id),
            component: NewProcessor {
                processor_type: spec.processor_type.clone(),
                bundle: spec.bundle.clone(),
                position,
                name: spec.name.clone(),
            },
        };
        let builder = self
            .request(
                Method::POST,
                &format!("process-groups/{parent_group_id}/processors"),
            )
            .await?
            .json(&body);
        self.send_json(builder).await
    }

    async fn get_controller_services(&self) -> Result<ControllerServicesResponse> {
        self.send_json(
            self.request(
                Method::GET,
                "flow/process-groups/root/controller-services",
            )
            .await?,
        )
        .await
    }

    async fn set_controller_service_state(
        &self,
        id: &ControllerServiceId,
        enabled: bool,
    ) -> Result<()> {
        let revision = self
            .current_revision(&format!("controller-services/{id}"))
            .await?;
        let body = ControllerServiceRunStatusRequest {
            revision,
            state: if enabled {
                ScheduledState::Enabled
            } else {
                ScheduledState::Disabled
            },
            disconnected_node_acknowledged: false,
        };
        let builder = self
            .request(Method::PUT, &format!("controller-services/{id}/run-status"))
            .await?
            .json(&body);
        self.send(builder).await?;
        Ok(())
    }

    async fn delete_controller_service(&self, id: &ControllerServiceId) -> Result<()> {
        self.delete_versioned(&format!("controller-services/{id}"))
            .await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
