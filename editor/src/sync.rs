use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::{EditorConfig, SyncMode};
use crate::error::EditorError;

/// Runs after a page has been saved.
pub trait SyncHook {
    fn after_save(&self, route: &str) -> Result<(), EditorError>;
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSync;

impl SyncHook for NoSync {
    fn after_save(&self, _route: &str) -> Result<(), EditorError> {
        Ok(())
    }
}

/// Runs an external command, e.g. a git push of the pages directory.
#[derive(Debug, Clone)]
pub struct CommandSync {
    program: String,
    args: Vec<String>,
    mode: SyncMode,
}

impl CommandSync {
    /// Split a whitespace-separated command line. `None` when it is blank.
    pub fn from_command_line(command: &str, mode: SyncMode) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(CommandSync {
            program,
            args: parts.collect(),
            mode,
        })
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl SyncHook for CommandSync {
    fn after_save(&self, route: &str) -> Result<(), EditorError> {
        match self.mode {
            SyncMode::Background => {
                let child = self.command().spawn()?;
                info!(route, pid = child.id(), program = %self.program, "sync started");
            }
            SyncMode::Foreground => {
                let status = self.command().status()?;
                if !status.success() {
                    return Err(EditorError::Sync(format!("`{}` exited with {}", self.program, status)));
                }
                debug!(route, program = %self.program, "sync finished");
            }
        }
        Ok(())
    }
}

/// The hook described by `config`: a command when `git_sync` is on, else nothing.
pub fn from_config(config: &EditorConfig) -> Box<dyn SyncHook> {
    if !config.git_sync {
        return Box::new(NoSync);
    }
    match CommandSync::from_command_line(&config.git_sync_command, config.git_sync_mode) {
        Some(hook) => Box::new(hook),
        None => Box::new(NoSync),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_lines() {
        let hook = CommandSync::from_command_line("bin/plugin git-sync sync", SyncMode::Foreground)
            .unwrap();
        assert_eq!(hook.program, "bin/plugin");
        assert_eq!(hook.args, vec!["git-sync", "sync"]);
        assert!(CommandSync::from_command_line("   ", SyncMode::Background).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn foreground_reports_failure() {
        let ok = CommandSync::from_command_line("true", SyncMode::Foreground).unwrap();
        assert!(ok.after_save("/").is_ok());

        let failing = CommandSync::from_command_line("false", SyncMode::Foreground).unwrap();
        assert!(matches!(failing.after_save("/"), Err(EditorError::Sync(_))));
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let hook =
            CommandSync::from_command_line("definitely-not-a-real-sync-tool", SyncMode::Background)
                .unwrap();
        assert!(matches!(hook.after_save("/"), Err(EditorError::Io(_))));
    }
}
