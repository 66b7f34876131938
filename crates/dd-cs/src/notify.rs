use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use dd_core::{DdError, ErrorInfo};

/// Completion message for a finished fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl Notification {
    /// Builds the message sent when `model` finishes on `label`.
    pub fn completed(to: &str, model: &str, label: &str, started: &str, finished: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("Model {model} finished"),
            body: format!(
                "Your model {model} on data `{label}` has finished running.\n\
                 Started:  {started}\n\
                 Finished: {finished}\n"
            ),
        }
    }
}

/// Delivers completion notifications.
pub trait Notifier: Send + Sync {
    /// Sends `message`. Failures are returned to the caller.
    fn send(&self, message: &Notification) -> Result<(), DdError>;
}

/// Pipes messages into a local `sendmail`-compatible program.
#[derive(Debug, Clone)]
pub struct SendmailNotifier {
    program: PathBuf,
}

impl Default for SendmailNotifier {
    fn default() -> Self {
        Self::new("sendmail")
    }
}

impl SendmailNotifier {
    /// Uses `program` instead of `sendmail` from `PATH`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Notifier for SendmailNotifier {
    fn send(&self, message: &Notification) -> Result<(), DdError> {
        let fail = |code: &str, err: String| {
            DdError::Notify(
                ErrorInfo::new(code, err)
                    .with_context("program", self.program.display().to_string())
                    .with_context("to", message.to.clone()),
            )
        };
        let mut child = Command::new(&self.program)
            .arg("-t")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| fail("notify-spawn", err.to_string()))?;
        let mail = format!(
            "To: {}\nSubject: {}\n\n{}",
            message.to, message.subject, message.body
        );
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(mail.as_bytes())
                .map_err(|err| fail("notify-write", err.to_string()))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|err| fail("notify-wait", err.to_string()))?;
        if !output.status.success() {
            return Err(fail(
                "notify-status",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}
