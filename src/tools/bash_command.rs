//! `BashCommand` tool implementation.
//!
//! Executes commands against the session's foreground shell, or against a
//! backgrounded one addressed by `bg_command_id`, and renders the terminal's
//! incremental output since the last call.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{Result, WinxError};
use crate::state::bash_state::BashState;
use crate::types::{BashAction, BashCommand};

/// Shown when a caller tries to send a new command while one is still running.
const WAITING_INPUT_MESSAGE: &str = "A command is already running. NOTE: you can't run multiple \
commands on the same shell at once.
1. Get its latest output with a status_check.
2. Use send_text or send_specials to interact with the running program, OR
3. interrupt it first by sending CtrlC via send_specials.
";

fn pty_error(context: &str, err: anyhow::Error) -> WinxError {
    WinxError::CommandExecutionError { message: Arc::new(format!("{context}: {err}")) }
}

fn render_status(rendered: &str, complete: bool, shell_id: &str) -> String {
    if complete {
        format!("{rendered}\n\n(shell {shell_id} is idle, ready for next command)")
    } else {
        format!("{rendered}\n\n(shell {shell_id} is still running; use status_check to poll)")
    }
}

pub async fn handle_tool_call(
    bash_state: Arc<Mutex<Option<BashState>>>,
    cmd: BashCommand,
) -> Result<String> {
    let mut guard = bash_state.lock().await;
    let state = guard.as_mut().ok_or(WinxError::BashStateNotInitialized)?;

    if cmd.chat_id != state.current_chat_id {
        return Err(WinxError::ChatIdMismatch {
            message: Arc::new(format!(
                "No saved bash state found for chat ID {}. Please initialize first with this ID.",
                cmd.chat_id
            )),
        });
    }

    let wait_for_seconds = cmd.wait_for_seconds.unwrap_or(15.0);

    // Launching a brand-new background shell is the one case that doesn't
    // target an already-registered `ShellInstance`.
    if cmd.is_background {
        let BashAction::Command { command } = &cmd.action_json else {
            return Err(WinxError::ParameterValidationError {
                field: Arc::new("action_json".to_string()),
                message: Arc::new("is_background requires a Command action".to_string()),
            });
        };
        let bg_id = cmd.bg_command_id.clone().ok_or_else(|| WinxError::ParameterValidationError {
            field: Arc::new("bg_command_id".to_string()),
            message: Arc::new("bg_command_id is required to launch a background command"
                .to_string()),
        })?;
        if !state.is_command_allowed(command) {
            return Err(WinxError::CommandNotAllowed {
                message: Arc::new(state.get_mode_violation_message("execute", command)),
            });
        }
        state.spawn_background_shell(&bg_id).map_err(|e| pty_error("spawning background shell", e))?;
        debug!("spawned background shell {bg_id}, sending command");

        let mut registry = state.background.lock().unwrap();
        let instance = registry.get_mut(&bg_id).expect("just spawned");
        instance.pty.send_command(command).map_err(|e| pty_error("sending command", e))?;
        let (raw, complete) =
            instance.pty.read_output(wait_for_seconds).map_err(|e| pty_error("reading output", e))?;
        let rendered = instance.terminal.get_incremental_output(&raw);
        return Ok(render_status(&rendered, complete, &bg_id));
    }

    let (is_foreground, key) = match &cmd.bg_command_id {
        Some(id) => (false, id.clone()),
        None => {
            state.ensure_foreground_shell()?;
            (true, state.current_chat_id.clone())
        }
    };

    let registry = if is_foreground { &state.foreground } else { &state.background };
    let mut registry_guard = registry.lock().unwrap();
    let instance = registry_guard.get_mut(&key).ok_or_else(|| WinxError::ShellNotAlive {
        message: Arc::new(format!("No shell registered for id '{key}'")),
    })?;
    instance.ensure_alive().map_err(|e| pty_error("checking shell liveness", e))?;

    match &cmd.action_json {
        BashAction::Command { command } => {
            if instance.pty.command_running {
                return Err(WinxError::CommandAlreadyRunning {
                    current_command: Arc::new(instance.pty.last_command.clone()),
                    duration_seconds: 0.0,
                });
            }
            if !state.is_command_allowed(command) {
                return Err(WinxError::CommandNotAllowed {
                    message: Arc::new(state.get_mode_violation_message("execute", command)),
                });
            }
            instance.pty.send_command(command).map_err(|e| pty_error("sending command", e))?;
            let (raw, complete) = instance
                .pty
                .read_output(wait_for_seconds)
                .map_err(|e| pty_error("reading output", e))?;
            let rendered = instance.terminal.get_incremental_output(&raw);
            Ok(render_status(&rendered, complete, &key))
        }
        BashAction::StatusCheck { .. } => {
            let (raw, complete) = instance
                .pty
                .read_output(0.2)
                .map_err(|e| pty_error("polling status", e))?;
            let rendered = instance.terminal.get_incremental_output(&raw);
            if instance.pty.command_running && !complete {
                Ok(format!(
                    "Command still running: {}\n{}",
                    instance.pty.last_command,
                    render_status(&rendered, complete, &key)
                ))
            } else {
                Ok(format!("No command is running.\n{}", render_status(&rendered, true, &key)))
            }
        }
        BashAction::SendText { send_text } => {
            if send_text.is_empty() {
                return Err(WinxError::MissingParameterError {
                    field: Arc::new("send_text".to_string()),
                    message: Arc::new("send_text cannot be empty".to_string()),
                });
            }
            instance.pty.send_text(send_text).map_err(|e| pty_error("sending text", e))?;
            let (raw, complete) = instance
                .pty
                .read_output(wait_for_seconds)
                .map_err(|e| pty_error("reading output", e))?;
            let rendered = instance.terminal.get_incremental_output(&raw);
            Ok(render_status(&rendered, complete, &key))
        }
        BashAction::SendSpecials { send_specials } => {
            if send_specials.is_empty() {
                return Err(WinxError::MissingParameterError {
                    field: Arc::new("send_specials".to_string()),
                    message: Arc::new("send_specials cannot be empty".to_string()),
                });
            }
            for special in send_specials {
                instance
                    .pty
                    .send_special_key(special.as_pty_key())
                    .map_err(|e| pty_error("sending special key", e))?;
            }
            let (raw, complete) = instance
                .pty
                .read_output(wait_for_seconds)
                .map_err(|e| pty_error("reading output", e))?;
            let rendered = instance.terminal.get_incremental_output(&raw);
            Ok(render_status(&rendered, complete, &key))
        }
        BashAction::SendAscii { send_ascii } => {
            if send_ascii.is_empty() {
                return Err(WinxError::MissingParameterError {
                    field: Arc::new("send_ascii".to_string()),
                    message: Arc::new("send_ascii cannot be empty".to_string()),
                });
            }
            let text: String = send_ascii.iter().map(|&b| b as char).collect();
            instance.pty.send_text(&text).map_err(|e| pty_error("sending ascii", e))?;
            let (raw, complete) = instance
                .pty
                .read_output(wait_for_seconds)
                .map_err(|e| pty_error("reading output", e))?;
            let rendered = instance.terminal.get_incremental_output(&raw);
            Ok(render_status(&rendered, complete, &key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_input_message_mentions_status_check() {
        assert!(WAITING_INPUT_MESSAGE.contains("status_check"));
    }
}
