use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::{allowed_extension, check_inline_size, is_data_image_uri, is_image_mime};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("No image file provided")]
    NoImageFile,
    #[error("Failed to parse form data")]
    MalformedForm(String),
    #[error("Valid base64 image data is required")]
    InvalidInlineImage,
    #[error("Invalid JSON body")]
    InvalidJson(String),
    #[error("{0}")]
    TooLarge(&'static str),
}

impl ValidationError {
    pub fn details(&self) -> Option<String> {
        match self {
            ValidationError::MalformedForm(details) | ValidationError::InvalidJson(details) => {
                Some(details.clone())
            }
            _ => None,
        }
    }
}

/// Decides whether a multipart part may be stored. The declared MIME type
/// must mention "image" and the filename must carry an allowed extension;
/// either one alone is not enough. Returns the extension to store under.
pub fn accept_image_part(mime_type: Option<&str>, filename: Option<&str>) -> Option<&'static str> {
    let is_image = mime_type.is_some_and(is_image_mime);
    let extension = filename.and_then(allowed_extension);
    match (is_image, extension) {
        (true, Some(extension)) => Some(extension),
        _ => None,
    }
}

/// Checks an inline payload before anything is spawned: the `data:image`
/// prefix, a decodable base64 body, and the 5MB decoded size limit.
pub fn validate_inline(image: Option<String>) -> Result<String, ValidationError> {
    let data_uri = image
        .filter(|image| is_data_image_uri(image))
        .ok_or(ValidationError::InvalidInlineImage)?;

    let (_, encoded) = data_uri
        .split_once(',')
        .ok_or(ValidationError::InvalidInlineImage)?;
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| ValidationError::InvalidInlineImage)?;
    check_inline_size(decoded.len() as u64).map_err(ValidationError::TooLarge)?;

    Ok(data_uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{INLINE_TOO_LARGE, MAX_INLINE_IMAGE_BYTES};

    fn data_uri(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn image_part_needs_both_mime_and_extension() {
        assert_eq!(accept_image_part(Some("image/png"), Some("cat.png")), Some("png"));
        assert_eq!(accept_image_part(Some("image/jpeg"), Some("CAT.JPEG")), Some("jpeg"));
        assert_eq!(accept_image_part(Some("text/plain"), Some("cat.png")), None);
        assert_eq!(accept_image_part(Some("image/png"), Some("cat.txt")), None);
        assert_eq!(accept_image_part(None, Some("cat.png")), None);
        assert_eq!(accept_image_part(Some("image/png"), None), None);
    }

    #[test]
    fn every_allowed_extension_is_accepted() {
        for name in ["a.jpg", "a.jpeg", "a.png", "a.gif", "a.bmp", "a.webp"] {
            assert!(accept_image_part(Some("image/x"), Some(name)).is_some(), "{name}");
        }
        assert!(accept_image_part(Some("image/tiff"), Some("a.tiff")).is_none());
    }

    #[test]
    fn inline_payload_must_be_a_data_image_uri() {
        assert_eq!(validate_inline(None), Err(ValidationError::InvalidInlineImage));
        assert_eq!(
            validate_inline(Some("iVBORw0KGgo=".into())),
            Err(ValidationError::InvalidInlineImage)
        );
        assert_eq!(
            validate_inline(Some("data:text/plain;base64,SGk=".into())),
            Err(ValidationError::InvalidInlineImage)
        );
    }

    #[test]
    fn inline_payload_must_decode() {
        assert_eq!(
            validate_inline(Some("data:image/png;base64".into())),
            Err(ValidationError::InvalidInlineImage)
        );
        assert_eq!(
            validate_inline(Some("data:image/png;base64,@@not-base64@@".into())),
            Err(ValidationError::InvalidInlineImage)
        );
    }

    #[test]
    fn inline_payload_is_returned_untouched() {
        let uri = data_uri(b"\x89PNG\r\n");
        assert_eq!(validate_inline(Some(uri.clone())), Ok(uri));
    }

    #[test]
    fn inline_size_limit_applies_to_decoded_bytes() {
        let at_limit = vec![0u8; MAX_INLINE_IMAGE_BYTES as usize];
        assert!(validate_inline(Some(data_uri(&at_limit))).is_ok());

        let over = vec![0u8; MAX_INLINE_IMAGE_BYTES as usize + 1];
        assert_eq!(
            validate_inline(Some(data_uri(&over))),
            Err(ValidationError::TooLarge(INLINE_TOO_LARGE))
        );
    }
}
