use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};

/// Largest decoded image accepted by the inline (data URI) pipeline.
pub const MAX_INLINE_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Largest file accepted by the multipart pipeline.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const DATA_URI_PREFIX: &str = "data:image";

pub const ALLOWED_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

pub const INLINE_TOO_LARGE: &str = "Image size exceeds 5MB limit";
pub const UPLOAD_TOO_LARGE: &str = "Image size exceeds 10MB limit";

/// How the image travels from the browser to the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum Transport {
    #[strum(serialize = "multipart")]
    Multipart,
    #[strum(serialize = "inline")]
    Inline,
}

impl Transport {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Transport::Multipart => "/api/predict",
            Transport::Inline => "/api/predict-optimized",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PredictRequest {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Rejects inline images over the 5MB limit. Used by the browser before
/// encoding and by the server after decoding.
pub fn check_inline_size(size: u64) -> Result<(), &'static str> {
    if size > MAX_INLINE_IMAGE_BYTES {
        return Err(INLINE_TOO_LARGE);
    }
    Ok(())
}

pub fn check_upload_size(size: u64) -> Result<(), &'static str> {
    if size > MAX_UPLOAD_BYTES {
        return Err(UPLOAD_TOO_LARGE);
    }
    Ok(())
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.contains("image")
}

/// Matches the filename against [`ALLOWED_EXTENSIONS`], ignoring case, and
/// returns the matched extension without its dot.
pub fn allowed_extension(filename: &str) -> Option<&'static str> {
    let lowered = filename.to_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| lowered.ends_with(*ext))
        .map(|ext| &ext[1..])
}

pub fn is_data_image_uri(payload: &str) -> bool {
    payload.starts_with(DATA_URI_PREFIX)
}

/// Reads a prediction endpoint's JSON body into the text shown to the user:
/// the label on success, the `error` message otherwise.
pub fn describe_response(ok: bool, body: &Value) -> Result<String, String> {
    if !ok {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Prediction failed");
        return Err(message.to_string());
    }
    match body.get("prediction") {
        Some(Value::String(label)) => Ok(label.clone()),
        Some(other) => Ok(other.to_string()),
        None => Ok(body.to_string()),
    }
}
