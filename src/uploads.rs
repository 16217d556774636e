use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use actix_web::web::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpg", "image/jpeg", "image/png"];

const UNSUPPORTED_MSG: &str = "Only JPEG and PNG files are allowed";

/// Disk-backed photo store under `{app_root}/uploads`. Files are named
/// `{epoch_millis}-{original_filename}` and referenced by records through
/// the returned `uploads/...` relative path.
#[derive(Clone)]
pub struct AttachmentStore {
    app_root: PathBuf,
}

impl AttachmentStore {
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        AttachmentStore {
            app_root: app_root.into(),
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.app_root.join("uploads")
    }

    fn resolve(&self, relative_path: &str) -> PathBuf {
        self.app_root.join(relative_path)
    }

    /// Streams a photo to disk. The stream is consumed to completion or
    /// aborted at the size cap; a failed upload never leaves bytes behind.
    pub async fn store<S>(
        &self,
        mut stream: S,
        original_filename: &str,
        declared_mime: &str,
    ) -> Result<String, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>> + Unpin,
    {
        let filename = sanitize_filename(original_filename);
        let extension_ok = Path::new(&filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        let mime_ok = ALLOWED_MIME_TYPES.contains(&declared_mime.to_ascii_lowercase().as_str());
        if !extension_ok || !mime_ok {
            return Err(AppError::UnsupportedFileType(UNSUPPORTED_MSG.to_string()));
        }

        let dir = self.upload_dir();
        fs::create_dir_all(&dir).await.map_err(|err| {
            log::error!("Failed to create upload directory: {}", err);
            AppError::Internal("File storage error".to_string())
        })?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let unique_name = format!("{}-{}", stamp, filename);
        let part_path = dir.join(format!("{}.part", unique_name));

        let header = match write_stream(&part_path, &mut stream).await {
            Ok(header) => header,
            Err(err) => {
                remove_quietly(&part_path).await;
                return Err(err);
            }
        };

        // The declared type is client-supplied; the leading bytes settle it.
        let content_ok = infer::get(&header)
            .map(|kind| matches!(kind.mime_type(), "image/jpeg" | "image/png"))
            .unwrap_or(false);
        if !content_ok {
            remove_quietly(&part_path).await;
            return Err(AppError::UnsupportedFileType(UNSUPPORTED_MSG.to_string()));
        }

        let final_path = dir.join(&unique_name);
        if let Err(err) = fs::rename(&part_path, &final_path).await {
            log::error!("Failed to finalize upload {}: {}", unique_name, err);
            remove_quietly(&part_path).await;
            return Err(AppError::Internal("File storage error".to_string()));
        }

        Ok(format!("uploads/{}", unique_name))
    }

    /// Writes the new photo first and deletes the old one only once the
    /// new file is fully on disk, so a failed upload never destroys a
    /// valid existing photo.
    pub async fn replace<S>(
        &self,
        old_relative_path: Option<&str>,
        stream: S,
        original_filename: &str,
        declared_mime: &str,
    ) -> Result<String, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>> + Unpin,
    {
        let new_path = self.store(stream, original_filename, declared_mime).await?;
        if let Some(old) = old_relative_path {
            self.delete(old).await;
        }
        Ok(new_path)
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn delete(&self, relative_path: &str) {
        let path = self.resolve(relative_path);
        if let Err(err) = fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::error!("Failed to remove attachment {}: {}", relative_path, err);
            }
        }
    }
}

async fn write_stream<S>(path: &Path, stream: &mut S) -> Result<Vec<u8>, AppError>
where
    S: Stream<Item = Result<Bytes, AppError>> + Unpin,
{
    let mut file = fs::File::create(path).await.map_err(|err| {
        log::error!("Failed to create {}: {}", path.display(), err);
        AppError::Internal("File storage error".to_string())
    })?;

    let mut written: usize = 0;
    let mut header = Vec::with_capacity(32);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len();
        if written > MAX_PHOTO_BYTES {
            return Err(AppError::FileTooLarge(
                "File size exceeds the 5 MiB limit".to_string(),
            ));
        }
        if header.len() < 32 {
            let take = (32 - header.len()).min(chunk.len());
            header.extend_from_slice(&chunk[..take]);
        }
        file.write_all(&chunk).await.map_err(|err| {
            log::error!("Failed to write {}: {}", path.display(), err);
            AppError::Internal("File storage error".to_string())
        })?;
    }

    file.flush().await.map_err(|err| {
        log::error!("Failed to flush {}: {}", path.display(), err);
        AppError::Internal("File storage error".to_string())
    })?;

    Ok(header)
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            log::error!("Failed to remove {}: {}", path.display(), err);
        }
    }
}

/// Strips any directory components from a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}
