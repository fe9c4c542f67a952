use shared::{
    domain::{Bundle, ComponentId, ControllerServiceId},
    protocol::ProcessorSpec,
};

pub const HELP: &str = "\
commands:
  ls                                   refresh the current listing
  open <id> [name]                     enter a process group
  back                                 return to the root canvas
  select <id> <name>                   select a process group
  clear                                clear the selection
  do <token>                           run a toolbar action (delete, copy, paste, Start, Stop, Enable, Disable, configuration)
  confirm-delete | cancel-delete       answer a pending delete
  create <name> [parameter-context]    create a process group
  add-processor <type> <g:a:v>         add a processor to the open group
  tab <name> | tabs                    switch tab / show the tab strip
  services                             load controller services
  service-toggle <id>                  open the enable/disable drawer
  service-confirm | service-cancel     answer the enable/disable drawer
  service-delete <id>                  delete an INVALID controller service
  status                               print the workspace state
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Open { id: ComponentId, name: String },
    Back,
    Select { id: ComponentId, name: String },
    Clear,
    Toolbar(String),
    ConfirmDelete,
    CancelDelete,
    Create { name: String, parameter_context: Option<String> },
    AddProcessor(ProcessorSpec),
    Tab(String),
    Tabs,
    Services,
    ServiceToggle(ControllerServiceId),
    ServiceConfirm,
    ServiceCancel,
    ServiceDelete(ControllerServiceId),
    Status,
    Help,
    Quit,
}

/// Parses one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb, rest.as_slice()) {
        ("ls", []) => Command::List,
        ("open", [id, name @ ..]) => Command::Open {
            id: ComponentId::from(*id),
            name: if name.is_empty() {
                (*id).to_string()
            } else {
                name.join(" ")
            },
        },
        ("back", []) => Command::Back,
        ("select", [id, name @ ..]) if !name.is_empty() => Command::Select {
            id: ComponentId::from(*id),
            name: name.join(" "),
        },
        ("clear", []) => Command::Clear,
        ("do", [token]) => Command::Toolbar((*token).to_string()),
        ("confirm-delete", []) => Command::ConfirmDelete,
        ("cancel-delete", []) => Command::CancelDelete,
        ("create", [name]) => Command::Create {
            name: (*name).to_string(),
            parameter_context: None,
        },
        ("create", [name, context]) => Command::Create {
            name: (*name).to_string(),
            parameter_context: Some((*context).to_string()),
        },
        ("add-processor", [processor_type, coordinates]) => {
            let bundle = Bundle::parse(coordinates)
                .ok_or_else(|| format!("bundle must be group:artifact:version, got '{coordinates}'"))?;
            Command::AddProcessor(ProcessorSpec {
                processor_type: (*processor_type).to_string(),
                bundle,
                name: None,
            })
        }
        ("tab", [name]) => Command::Tab((*name).to_string()),
        ("tabs", []) => Command::Tabs,
        ("services", []) => Command::Services,
        ("service-toggle", [id]) => Command::ServiceToggle(ControllerServiceId::from(*id)),
        ("service-confirm", []) => Command::ServiceConfirm,
        ("service-cancel", []) => Command::ServiceCancel,
        ("service-delete", [id]) => Command::ServiceDelete(ControllerServiceId::from(*id)),
        ("status", []) => Command::Status,
        ("help", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => return Err(format!("unrecognized command '{}'; try 'help'", line.trim())),
    };
    Ok(Some(command))
}
