//! The control-plane boundary.
//!
//! Higher layers (an HTTP router, an admin console) hand this module a
//! command name plus loosely-typed JSON arguments. The boundary parses them,
//! dispatches to the [`LobbyService`], and collapses every failure into a
//! stable code string — callers never see internal error detail, which stays
//! in the server log with full context.

use std::sync::Arc;

use serde_json::Value;
use speedlobby_protocol::SteamId;
use speedlobby_registry::{LobbyError, LobbyService};

/// A parsed control-plane command.
///
/// Missing string arguments parse as empty strings and missing booleans as
/// `false`, so argument-shape mistakes surface as the same domain errors a
/// deliberate empty value would produce (`NameMissing`, `NameInvalid`,
/// `UnknownParticipant`) rather than as a separate arity error.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    List,
    Get { name: String },
    GetData { name: String },
    Create { name: String, password: String },
    Join { name: String, password: String, steamid: SteamId },
    Rename { name: String, new_name: String },
    Password { name: String, password: String },
    Map { name: String, map_id: String },
    Ready { name: String, ready: bool, steamid: SteamId, force: bool },
}

impl ControlCommand {
    /// Parses a command name and its positional arguments. Returns `None`
    /// for an unrecognized command.
    pub fn parse(command: &str, args: &[Value]) -> Option<Self> {
        let cmd = match command {
            "list" => Self::List,
            "get" => Self::Get { name: str_arg(args, 0) },
            "getdata" => Self::GetData { name: str_arg(args, 0) },
            "create" => Self::Create {
                name: str_arg(args, 0),
                password: str_arg(args, 1),
            },
            "join" => Self::Join {
                name: str_arg(args, 0),
                password: str_arg(args, 1),
                steamid: SteamId::new(str_arg(args, 2)),
            },
            "rename" => Self::Rename {
                name: str_arg(args, 0),
                new_name: str_arg(args, 1),
            },
            "password" => Self::Password {
                name: str_arg(args, 0),
                password: str_arg(args, 1),
            },
            "map" => Self::Map {
                name: str_arg(args, 0),
                map_id: str_arg(args, 1),
            },
            "ready" => Self::Ready {
                name: str_arg(args, 0),
                ready: bool_arg(args, 1),
                steamid: SteamId::new(str_arg(args, 2)),
                force: bool_arg(args, 3),
            },
            _ => return None,
        };
        Some(cmd)
    }
}

/// Positional string argument; numbers are accepted and normalized to text
/// (upstream id fields arrive as either).
fn str_arg(args: &[Value], index: usize) -> String {
    match args.get(index) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn bool_arg(args: &[Value], index: usize) -> bool {
    args.get(index).and_then(Value::as_bool).unwrap_or(false)
}

/// Handles one control-plane call.
///
/// On success, returns the command's result as JSON (queries return their
/// data, mutations return `"SUCCESS"`). On failure, returns the stable code
/// string and logs the full context — with password arguments redacted.
pub async fn handle(
    service: &Arc<LobbyService>,
    command: &str,
    args: &[Value],
) -> Result<Value, &'static str> {
    let Some(parsed) = ControlCommand::parse(command, args) else {
        tracing::warn!(command, "unknown control command");
        return Err("UnknownCommand");
    };

    match dispatch(service, parsed).await {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(
                command,
                args = %redacted(command, args),
                error = %e,
                "control command failed"
            );
            Err(e.code())
        }
    }
}

async fn dispatch(service: &Arc<LobbyService>, command: ControlCommand) -> Result<Value, LobbyError> {
    let success = || Value::String("SUCCESS".to_string());
    match command {
        ControlCommand::List => to_json(&service.list().await),
        ControlCommand::Get { name } => to_json(&service.get(&name).await?),
        ControlCommand::GetData { name } => to_json(&service.get_data(&name).await?),
        ControlCommand::Create { name, password } => {
            service.create(&name, &password).await?;
            Ok(success())
        }
        ControlCommand::Join { name, password, steamid } => {
            service.join(&name, &password, &steamid).await?;
            Ok(success())
        }
        ControlCommand::Rename { name, new_name } => {
            service.rename(&name, &new_name).await?;
            Ok(success())
        }
        ControlCommand::Password { name, password } => {
            service.set_password(&name, &password).await?;
            Ok(success())
        }
        ControlCommand::Map { name, map_id } => {
            service.set_map(&name, &map_id).await?;
            Ok(success())
        }
        ControlCommand::Ready { name, ready, steamid, force } => {
            service.ready(&name, ready, &steamid, force).await?;
            Ok(success())
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, LobbyError> {
    serde_json::to_value(value).map_err(|e| LobbyError::Internal(format!("encode failed: {e}")))
}

/// Renders arguments for the failure log, masking password slots.
fn redacted(command: &str, args: &[Value]) -> String {
    let mut shown: Vec<String> = args.iter().map(Value::to_string).collect();
    if matches!(command, "create" | "join" | "password") {
        if let Some(slot) = shown.get_mut(1) {
            *slot = "\"********\"".to_string();
        }
    }
    shown.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_unknown_command_is_none() {
        assert_eq!(ControlCommand::parse("explode", &[]), None);
    }

    #[test]
    fn test_parse_ready_with_all_arguments() {
        let args = [json!("speedrun"), json!(true), json!("76561198000000001"), json!(true)];
        assert_eq!(
            ControlCommand::parse("ready", &args),
            Some(ControlCommand::Ready {
                name: "speedrun".into(),
                ready: true,
                steamid: SteamId::new("76561198000000001"),
                force: true,
            })
        );
    }

    #[test]
    fn test_parse_defaults_missing_arguments() {
        // A bare `ready` defaults to an unready request for nobody; the
        // registry rejects it with a domain error, not a parse error.
        assert_eq!(
            ControlCommand::parse("ready", &[]),
            Some(ControlCommand::Ready {
                name: String::new(),
                ready: false,
                steamid: SteamId::new(""),
                force: false,
            })
        );
    }

    #[test]
    fn test_parse_accepts_numeric_ids() {
        let args = [json!("speedrun"), json!(3298240625u64)];
        assert_eq!(
            ControlCommand::parse("map", &args),
            Some(ControlCommand::Map { name: "speedrun".into(), map_id: "3298240625".into() })
        );
    }

    #[test]
    fn test_redacted_masks_password_slot() {
        let args = [json!("speedrun"), json!("hunter2"), json!("76561198000000001")];
        let shown = redacted("join", &args);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("********"));
        assert!(shown.contains("speedrun"));
    }

    #[test]
    fn test_redacted_leaves_other_commands_alone() {
        let args = [json!("speedrun"), json!("newname")];
        assert_eq!(redacted("rename", &args), "\"speedrun\", \"newname\"");
    }
}
