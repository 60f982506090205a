use crate::announce::{Announcement, Announcer};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Speaks greetings through an external text-to-speech program
/// (`espeak`, `say`, ...). The greeting is passed as the last argument.
///
/// The child is reaped on a background task; nobody waits for the utterance.
#[derive(Debug, Clone)]
pub struct SpeechCommandAnnouncer {
    program: String,
    args: Vec<String>,
}

impl SpeechCommandAnnouncer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `command[0]` is the program, the rest are leading arguments.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl Announcer for SpeechCommandAnnouncer {
    fn announce(&self, announcement: &Announcement) {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(&announcement.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start speech command '{}': {}", self.program, e);
                return;
            }
        };

        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!("Speech command finished"),
                Ok(status) => warn!("Speech command '{}' exited with {}", program, status),
                Err(e) => warn!("Speech command '{}' failed: {}", program, e),
            }
        });
    }
}
