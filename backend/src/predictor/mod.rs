pub mod invoker;
pub mod normalize;

use serde_json::{json, Value};
use shared::Transport;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use self::normalize::normalize_output;

/// The single argument handed to the external classifier.
#[derive(Debug, Clone)]
pub enum PredictorInput {
    /// Path of an upload persisted by the multipart pipeline.
    File(PathBuf),
    /// A full `data:image/...;base64,...` URI.
    Inline(String),
}

impl PredictorInput {
    pub fn transport(&self) -> Transport {
        match self {
            PredictorInput::File(_) => Transport::Multipart,
            PredictorInput::Inline(_) => Transport::Inline,
        }
    }

    pub fn as_arg(&self) -> &OsStr {
        match self {
            PredictorInput::File(path) => path.as_os_str(),
            PredictorInput::Inline(data_uri) => OsStr::new(data_uri),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Label(String),
    /// A JSON object printed by the predictor, forwarded untouched.
    Structured(Value),
}

impl Prediction {
    pub fn into_body(self) -> Value {
        match self {
            Prediction::Label(label) => json!({ "prediction": label }),
            Prediction::Structured(value) => value,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Failed to start predictor {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Predictor exceeded {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Predictor exited with {status}")]
    Exit { status: String, details: String },
    #[error("Predictor reported an error: {0}")]
    Reported(String),
    #[error("Predictor produced no output")]
    EmptyOutput,
    #[error("IO error while waiting for predictor: {0}")]
    Io(#[from] std::io::Error),
}

impl PredictError {
    /// Diagnostic text surfaced to the caller in the `details` field.
    pub fn details(&self) -> String {
        match self {
            PredictError::Exit { details, .. } => details.clone(),
            PredictError::Reported(text) => text.clone(),
            PredictError::EmptyOutput => "Unknown error".to_string(),
            PredictError::Timeout(limit) => format!("predictor exceeded {}s", limit.as_secs()),
            other => other.to_string(),
        }
    }
}

/// Turns the stdout of a successful run into a prediction. A JSON object is
/// forwarded as is; anything else is cleaned into a label.
pub fn interpret(stdout: &str) -> Result<Prediction, PredictError> {
    if let Ok(object @ Value::Object(_)) = serde_json::from_str::<Value>(stdout.trim()) {
        return Ok(Prediction::Structured(object));
    }

    let label = normalize_output(stdout);
    if label.is_empty() {
        return Err(PredictError::EmptyOutput);
    }
    if label.starts_with("Error") {
        return Err(PredictError::Reported(label));
    }
    Ok(Prediction::Label(label))
}
