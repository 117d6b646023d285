use crate::{AttestationClient, MeasurementRequest};
use async_trait::async_trait;
use pd_errors::AttestationError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Obtains tokens from an external helper program
///
/// The helper is invoked as `<program> <args..> --content-binding <hash>
/// --ttl-secs <n>` and must print the raw token on stdout.
#[derive(Debug, Clone)]
pub struct CommandAttestationClient {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAttestationClient {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AttestationClient for CommandAttestationClient {
    async fn request_measurement(
        &self,
        request: &MeasurementRequest,
    ) -> Result<Vec<u8>, AttestationError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--content-binding")
            .arg(&request.content_binding)
            .arg("--ttl-secs")
            .arg(request.ttl.as_secs().to_string())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                AttestationError::MeasurementFailed(format!(
                    "{} timed out after {}s",
                    self.program.display(),
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AttestationError::MeasurementFailed(format!(
                    "failed to run {}: {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            return Err(AttestationError::MeasurementFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(AttestationError::MeasurementFailed(format!(
                "{} produced no token",
                self.program.display()
            )));
        }
        Ok(output.stdout)
    }
}
