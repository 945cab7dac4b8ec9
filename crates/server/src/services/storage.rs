// Attachment storage for project submissions

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;
use tokio::fs;
use uuid::Uuid;

use crate::{
    db::models::KaryaType,
    error::{AppError, Result},
};

pub const PUBLIC_PREFIX: &str = "uploads";

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub relative_path: String,
    pub karya_type: KaryaType,
}

#[derive(Clone, Debug)]
pub struct AttachmentStore {
    base_path: PathBuf,
    max_bytes: usize,
}

impl AttachmentStore {
    pub fn new(base_path: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            base_path: base_path.into(),
            max_bytes,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {e}")))?;
        Ok(())
    }

    pub async fn store(&self, upload: &Upload) -> Result<StoredFile> {
        let karya_type = classify(&upload.content_type)?;

        if upload.data.is_empty() {
            return Err(AppError::InvalidSubmission("Uploaded file is empty".to_string()));
        }
        if upload.data.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        let ext = extension_for(upload.file_name.as_deref(), &upload.content_type);
        let id = Uuid::new_v4().simple().to_string();
        let file_name = format!("{}-{}.{ext}", Utc::now().timestamp_millis(), &id[..12]);

        self.init().await?;
        let path = self.base_path.join(&file_name);
        fs::write(&path, &upload.data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        tracing::info!(file = %file_name, bytes = upload.data.len(), "attachment stored");

        Ok(StoredFile {
            relative_path: format!("{PUBLIC_PREFIX}/{file_name}"),
            karya_type,
        })
    }

    // Missing files are not an error
    pub async fn remove(&self, relative_path: &str) -> Result<()> {
        let path = self.resolve(relative_path)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %relative_path, "attachment removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to delete file: {e}"))),
        }
    }

    pub async fn remove_quietly(&self, relative_path: &str) {
        if let Err(e) = self.remove(relative_path).await {
            tracing::warn!(path = %relative_path, error = %e, "failed to remove attachment");
        }
    }

    // Only the final component is honoured so a stored URL can never escape the upload dir.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf> {
        let name = Path::new(relative_path)
            .file_name()
            .ok_or_else(|| AppError::Internal(format!("Invalid attachment path: {relative_path}")))?;
        Ok(self.base_path.join(name))
    }
}

pub fn classify(content_type: &str) -> Result<KaryaType> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime.starts_with("image/") {
        Ok(KaryaType::Image)
    } else if mime == "application/pdf" {
        Ok(KaryaType::Pdf)
    } else {
        Err(AppError::UnsupportedType(format!(
            "Unsupported file type: {content_type}"
        )))
    }
}

fn extension_for(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    from_name.unwrap_or_else(|| {
        match content_type {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            "application/pdf" => "pdf",
            _ => "bin",
        }
        .to_string()
    })
}
