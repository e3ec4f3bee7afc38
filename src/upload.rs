//! Image upload bodies.
//!
//! Ghost accepts a single `multipart/form-data` part named `uploadimage` on
//! the uploads endpoint and answers with the stored image location.

use crate::error::{ApiError, Result};
use crate::request::{EncodedBody, RequestBody};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Form field Ghost reads the image from
pub const UPLOAD_FIELD: &str = "uploadimage";

/// A local image file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSource {
    path: PathBuf,
}

impl UploadSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UploadSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name sent with the part
    pub fn file_name(&self) -> Result<&str> {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ApiError::encode(format!("no usable file name in {}", self.path.display()))
            })
    }

    /// Image MIME type inferred from the file extension.
    ///
    /// Recognised extensions (case-insensitive): `png`, `jpg`/`jpeg`, `gif`,
    /// `svg`/`svgz`, `webp` and `ico`. Anything else, `bmp` and `tiff`
    /// included, is an [`ApiError::Encode`] error.
    pub fn mime_type(&self) -> Result<&'static str> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        extension
            .as_deref()
            .and_then(image_mime_type)
            .ok_or_else(|| {
                ApiError::encode(format!(
                    "cannot determine image type of {}",
                    self.path.display()
                ))
            })
    }
}

fn image_mime_type(extension: &str) -> Option<&'static str> {
    match extension {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" | "svgz" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        "ico" => Some("image/x-icon"),
        _ => None,
    }
}

/// Build a single-part multipart body
pub fn multipart_body(
    boundary: &str,
    field: &str,
    file_name: &str,
    mime_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field,
            file_name.replace('"', "%22")
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

impl RequestBody for UploadSource {
    fn encode_body(&self) -> Result<EncodedBody> {
        let file_name = self.file_name()?;
        let mime_type = self.mime_type()?;
        let content = fs::read(&self.path).map_err(|e| ApiError::Encode {
            reason: format!("cannot read {}", self.path.display()),
            source: Some(Box::new(e)),
        })?;

        let boundary = format!("ghost-api-{}", Uuid::new_v4().simple());
        tracing::debug!(file = file_name, mime_type, size = content.len(), "encoding upload");

        Ok(EncodedBody {
            content_type: format!("multipart/form-data; boundary={}", boundary),
            bytes: multipart_body(&boundary, UPLOAD_FIELD, file_name, mime_type, &content),
        })
    }
}
