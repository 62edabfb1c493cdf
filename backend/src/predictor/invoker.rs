use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

use super::{interpret, PredictError, Prediction, PredictorInput};
use crate::config::PredictorConfig;

#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: String,
}

/// Runs the external classifier as `<interpreter> <script> <image>`.
///
/// The image argument goes through the argument vector, never a shell, so
/// paths and data URIs are passed byte for byte.
#[derive(Clone, Debug)]
pub struct Predictor {
    config: PredictorConfig,
}

impl Predictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }

    fn script_for(&self, input: &PredictorInput) -> &Path {
        match input {
            PredictorInput::File(_) => &self.config.file_script,
            PredictorInput::Inline(_) => &self.config.inline_script,
        }
    }

    pub async fn predict(&self, input: &PredictorInput) -> Result<Prediction, PredictError> {
        let output = self.run(input).await?;
        interpret(&output.stdout)
    }

    /// Spawns the predictor and waits for it, bounded by the configured
    /// timeout. A child still running at the deadline is killed.
    pub async fn run(&self, input: &PredictorInput) -> Result<ProcessOutput, PredictError> {
        let script = self.script_for(input);
        let timeout = self.config.timeout();

        let mut command = Command::new(&self.config.interpreter);
        command
            .arg(script)
            .arg(input.as_arg())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!(
            "Spawning {} {} for {} input",
            self.config.interpreter,
            script.display(),
            input.transport()
        );

        let child = command.spawn().map_err(|source| PredictError::Spawn {
            program: self.config.interpreter.clone(),
            source,
        })?;
        let started = Instant::now();

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                log::warn!("Predictor timed out after {}s, killing it", timeout.as_secs());
                return Err(PredictError::Timeout(timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        log::info!(
            "Predictor finished with {} in {}ms",
            output.status,
            started.elapsed().as_millis()
        );

        if !output.status.success() {
            log::error!("Predictor stderr: {}", stderr.trim());
            let details = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|text| !text.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| output.status.to_string());
            return Err(PredictError::Exit {
                status: output.status.to_string(),
                details,
            });
        }

        if !stderr.trim().is_empty() {
            log::debug!("Predictor stderr: {}", stderr.trim());
        }

        Ok(ProcessOutput { stdout })
    }
}
