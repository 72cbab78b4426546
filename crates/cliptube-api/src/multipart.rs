use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::ApiError;

/// A fully-read multipart form: text fields by name, file parts by field
/// name. Small enough forms only; size caps are enforced per-file by the
/// handlers.
#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, String>,
    files: HashMap<String, Bytes>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if field.file_name().is_some() {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("failed reading upload: {e}")))?;
                form.files.insert(name, data);
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("failed reading field: {e}")))?;
                form.texts.insert(name, text);
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(|s| s.as_str())
    }

    /// Required non-empty text field.
    pub fn require_text(&self, name: &str) -> Result<&str, ApiError> {
        match self.text(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ApiError::validation(format!("{name} is required"))),
        }
    }

    pub fn file(&self, name: &str) -> Option<&Bytes> {
        self.files.get(name).filter(|b| !b.is_empty())
    }

    pub fn require_file(&self, name: &str) -> Result<&Bytes, ApiError> {
        self.file(name)
            .ok_or_else(|| ApiError::validation(format!("{name} file is required")))
    }
}
