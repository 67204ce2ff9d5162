//! Prediction request value objects

use crate::core::error::ValidationError;
use crate::core::text::non_blank;

/// Binary image payload submitted for classification (Value Object)
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    file_name: String,
    mime_type: String,
}

impl ImagePayload {
    /// Create a payload, inferring the MIME type from the file extension.
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_from_file_name(&file_name).to_string();
        Self {
            bytes,
            file_name,
            mime_type,
        }
    }

    /// Override the inferred MIME type; it must be a bare `type/subtype`.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Result<Self, ValidationError> {
        let mime_type = mime_type.into();
        if !is_mime_type(&mime_type) {
            return Err(ValidationError::InvalidMimeType(mime_type));
        }
        self.mime_type = mime_type.to_ascii_lowercase();
        Ok(self)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension used when storing a preview copy.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            _ => "bin",
        }
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn mime_from_file_name(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn is_mime_type(value: &str) -> bool {
    // RFC 6838 restricted names
    let token = |part: &str| {
        !part.is_empty()
            && part.len() <= 127
            && part
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
    };
    value
        .split_once('/')
        .is_some_and(|(kind, subtype)| token(kind) && token(subtype))
}

/// Input for one classification (Value Object)
///
/// Constructed on submit and consumed once by the classification client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    image: ImagePayload,
    text: Option<String>,
}

impl PredictionRequest {
    /// Build a request, rejecting an empty image.
    pub fn new(image: ImagePayload, text: Option<String>) -> Result<Self, ValidationError> {
        if image.is_empty() {
            return Err(ValidationError::MissingImage);
        }
        Ok(Self { image, text })
    }

    pub fn image(&self) -> &ImagePayload {
        &self.image
    }

    /// The text exactly as the user supplied it.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The text to send to the remote service, `None` when blank.
    pub fn query(&self) -> Option<&str> {
        non_blank(self.text.as_deref())
    }
}
