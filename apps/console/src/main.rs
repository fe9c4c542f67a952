mod commands;
mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use commands::Command;
use flow_api::{Credentials, FlowApi, HttpFlowApi, MissingFlowApi};
use shared::domain::ViewMode;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use workspace_core::{
    ActionDispatchTable, ControllerServiceEvent, ControllerServiceTableController, NavOverflow,
    WorkspaceController, WorkspaceError, WorkspaceEvent,
};

/// Tab strip order. Index 4 opens the creation panel.
const TABS: [&str; 5] = ["flow", "processors", "services", "parameters", "create"];

#[derive(Parser, Debug)]
#[command(about = "Line-oriented console for a flow server workspace")]
struct Args {
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    #[arg(long)]
    nifi_url: Option<String>,
    #[arg(long)]
    username: Option<String>,
    /// Run without a server; every remote call fails.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(&args.config)?;
    if let Some(url) = args.nifi_url {
        settings.nifi_url = url;
    }
    if let Some(username) = args.username {
        settings.username = Some(username);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    let api: Arc<dyn FlowApi> = if args.offline {
        warn!("offline mode: no flow server will be contacted");
        Arc::new(MissingFlowApi)
    } else {
        let mut http = HttpFlowApi::new(&settings.nifi_url)?;
        if let (Some(username), Some(password)) =
            (settings.username.clone(), settings.password.clone())
        {
            http = http.with_credentials(Credentials { username, password });
        }
        info!(url = %settings.nifi_url, client_id = http.client_id(), "using flow server");
        Arc::new(http)
    };

    let workspace_settings = settings.workspace_settings();
    let workspace = WorkspaceController::new(
        Arc::clone(&api),
        workspace_settings.clone(),
        ActionDispatchTable::standard(),
    );
    let services = ControllerServiceTableController::new(api, workspace_settings);
    let printers = [
        spawn_printer(workspace.subscribe_events(), describe_workspace_event),
        spawn_printer(services.subscribe_events(), describe_service_event),
    ];

    if let Err(err) = workspace.initialize().await {
        warn!("workspace did not initialize: {err}");
    }

    let mut tabs = NavOverflow::new(TABS.to_vec(), settings.visible_tabs);
    println!("{}", commands::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => run(command, &workspace, &services, &mut tabs).await,
            Err(message) => println!("{message}"),
        }
    }

    workspace.shutdown().await;
    services.shutdown().await;
    for printer in printers {
        printer.abort();
    }
    Ok(())
}

fn spawn_printer<E>(
    mut rx: broadcast::Receiver<E>,
    describe: fn(&E) -> String,
) -> JoinHandle<()>
where
    E: Clone + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => println!("  > {}", describe(&event)),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn describe_workspace_event(event: &WorkspaceEvent) -> String {
    match event {
        WorkspaceEvent::ViewChanged(view) => format!("view: {}", describe_view(view)),
        WorkspaceEvent::SelectionChanged(Some(selection)) => {
            format!("selected {} ({})", selection.name, selection.id)
        }
        WorkspaceEvent::SelectionChanged(None) => "selection cleared".to_string(),
        WorkspaceEvent::ProcessGroupsUpdated(groups) => {
            let mut out = format!("{} process group(s)", groups.len());
            for group in groups {
                out.push_str(&format!(
                    "\n      {:<38} {:<24} running={} stopped={} queued={} @({}, {})",
                    group.id.as_str(),
                    group.name,
                    group.running_count,
                    group.stopped_count,
                    group.queued,
                    group.position.x,
                    group.position.y
                ));
            }
            out
        }
        WorkspaceEvent::ProcessorsUpdated(processors) => {
            let mut out = format!("{} processor(s)", processors.len());
            for processor in processors {
                out.push_str(&format!(
                    "\n      {:<38} {:<24} {} tasks={} {}",
                    processor.id().as_str(),
                    processor.summary.name,
                    processor.processor_type,
                    processor.task_count,
                    processor.task_duration
                ));
            }
            out
        }
        WorkspaceEvent::CopyBufferChanged { filled } => {
            format!("copy buffer {}", if *filled { "filled" } else { "empty" })
        }
        WorkspaceEvent::DeleteConfirmationRequested(selection) => format!(
            "delete '{}'? answer with confirm-delete or cancel-delete",
            selection.name
        ),
        WorkspaceEvent::ConfigureRequested { id, counter } => {
            format!("configure {id} (request #{counter})")
        }
        WorkspaceEvent::CreationPanelChanged { open } => {
            format!("creation panel {}", if *open { "open" } else { "closed" })
        }
        WorkspaceEvent::ActionPhaseChanged { action, phase } => {
            format!("{}: {phase:?}", action.name())
        }
        WorkspaceEvent::StaleResultDiscarded { generation, latest } => {
            format!("discarded listing #{generation} (latest #{latest})")
        }
        WorkspaceEvent::FlowStatusUpdated(status) => format!(
            "flow status at {}: running={} stopped={} invalid={} disabled={} queued={}",
            status.fetched_at.format("%H:%M:%S"),
            status.controller.running_count,
            status.controller.stopped_count,
            status.controller.invalid_count,
            status.controller.disabled_count,
            status.controller.queued
        ),
        WorkspaceEvent::Alert(message) => format!("ALERT: {message}"),
    }
}

fn describe_service_event(event: &ControllerServiceEvent) -> String {
    match event {
        ControllerServiceEvent::LoadingChanged(true) => "loading controller services".to_string(),
        ControllerServiceEvent::LoadingChanged(false) => "controller services loaded".to_string(),
        ControllerServiceEvent::ListUpdated { services, source } => {
            let mut out = format!("{} controller service(s) from {source:?}", services.len());
            for service in services {
                out.push_str(&format!(
                    "\n      {:<38} {:<28} {:<10} {}",
                    service.id.as_str(),
                    service.name,
                    service.state.as_str(),
                    service.scope
                ));
            }
            out
        }
        ControllerServiceEvent::EnableDisableDrawerOpened { service, action } => format!(
            "{action:?} '{}'? answer with service-confirm or service-cancel",
            service.name
        ),
        ControllerServiceEvent::EditDrawerOpened(service) => format!("editing {}", service.name),
        ControllerServiceEvent::DrawersClosed => "drawers closed".to_string(),
        ControllerServiceEvent::Deleted(id) => format!("deleted controller service {id}"),
    }
}

fn describe_view(view: &ViewMode) -> String {
    match view {
        ViewMode::Canvas => "canvas".to_string(),
        ViewMode::InsideGroup {
            group_id,
            group_name,
        } => format!("inside '{group_name}' ({group_id})"),
        ViewMode::ControllerServices => "controller services".to_string(),
    }
}

fn report<T>(result: Result<T, WorkspaceError>) {
    if let Err(err) = result {
        println!("! {err}");
    }
}

fn print_tabs(tabs: &NavOverflow<&'static str>) {
    let overflow = tabs.overflow();
    if overflow.is_empty() {
        println!("tabs: {:?}", tabs.visible());
    } else {
        println!(
            "tabs: {:?}  More({}): {:?}",
            tabs.visible(),
            tabs.badge_count(),
            overflow
        );
    }
}

async fn run(
    command: Command,
    workspace: &Arc<WorkspaceController>,
    services: &Arc<ControllerServiceTableController>,
    tabs: &mut NavOverflow<&'static str>,
) {
    match command {
        Command::List => {
            let snapshot = workspace.snapshot().await;
            if snapshot.root_group_id.is_none() && snapshot.view.current_group_id().is_none() {
                if let Err(err) = workspace.resolve_root_group_id().await {
                    println!("! {err}");
                    return;
                }
            }
            report(workspace.refetch().await);
        }
        Command::Open { id, name } => workspace.on_box_double_click(id, name).await,
        Command::Back => workspace.on_breadcrumb_click().await,
        Command::Select { id, name } => workspace.on_box_click(id, name).await,
        Command::Clear => workspace.on_background_click().await,
        Command::Toolbar(token) => {
            let before = workspace.snapshot().await.view;
            workspace.on_toolbar_action(&token).await;
            let after = workspace.snapshot().await.view;
            if after == ViewMode::ControllerServices && before != after {
                report(services.fetch(true).await);
            }
        }
        Command::ConfirmDelete => report(workspace.confirm_delete().await),
        Command::CancelDelete => workspace.cancel_delete().await,
        Command::Create {
            name,
            parameter_context,
        } => {
            workspace.update_creation_form(name, parameter_context).await;
            report(workspace.submit_creation_form().await);
        }
        Command::AddProcessor(spec) => report(workspace.create_processor(spec).await),
        Command::Tab(name) => {
            let Some(index) = TABS.iter().position(|tab| *tab == name) else {
                println!("unknown tab '{name}'; tabs are {TABS:?}");
                return;
            };
            tabs.select(&TABS[index]);
            workspace.on_tab_change(index).await;
            print_tabs(tabs);
        }
        Command::Tabs => print_tabs(tabs),
        Command::Services => report(services.fetch(true).await),
        Command::ServiceToggle(id) => report(services.request_enable_disable(&id).await),
        Command::ServiceConfirm => report(services.confirm_enable_disable().await),
        Command::ServiceCancel => services.cancel_enable_disable().await,
        Command::ServiceDelete(id) => match services.request_delete(&id).await {
            Ok(true) => {}
            Ok(false) => println!("only INVALID controller services can be deleted"),
            Err(err) => println!("! {err}"),
        },
        Command::Status => {
            let snapshot = workspace.snapshot().await;
            let table = services.snapshot().await;
            println!("view:        {}", describe_view(&snapshot.view));
            println!(
                "root group:  {}",
                snapshot
                    .root_group_id
                    .as_ref()
                    .map_or("<unresolved>", |id| id.as_str())
            );
            println!(
                "selection:   {}",
                snapshot
                    .selection
                    .as_ref()
                    .map_or("<none>".to_string(), |s| format!("{} ({})", s.name, s.id))
            );
            println!(
                "listing:     {} group(s), {} processor(s)",
                snapshot.process_groups.len(),
                snapshot.processors.len()
            );
            println!("copy buffer: {}", snapshot.has_copy_buffer);
            println!(
                "services:    {} row(s), last refreshed {}",
                table.list.len(),
                table
                    .last_refreshed
                    .map_or("never".to_string(), |at| at.to_rfc3339())
            );
        }
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => {}
    }
}
