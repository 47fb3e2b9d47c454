use std::path::{Path, PathBuf};

use log::{error, warn};
use tokio::fs;
use uuid::Uuid;

use crate::errors::ApiError;

/// Raw upload as it came off the multipart stream.
#[derive(Debug)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Filenames are used as path segments, so anything that could walk out of
/// the storage directory is rejected outright.
pub fn sanitize_filename(name: &str) -> Result<&str, ApiError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(ApiError::Validation(format!("invalid filename '{}'", name)));
    }
    Ok(name)
}

fn stored_path(upload_dir: &Path, event_id: Uuid, filename: &str) -> PathBuf {
    upload_dir.join(event_id.to_string()).join(filename)
}

/// Writes the image under `<upload_dir>/<event_id>/<filename>` and returns
/// the reference string stored on the event row.
pub async fn save(upload_dir: &Path, event_id: Uuid, image: &ImageUpload) -> Result<String, ApiError> {
    let filename = sanitize_filename(&image.filename)?;
    let dir = upload_dir.join(event_id.to_string());
    fs::create_dir_all(&dir).await.map_err(|err| {
        error!("failed to create upload dir {:?}: {}", dir, err);
        ApiError::Internal
    })?;
    let path = stored_path(upload_dir, event_id, filename);
    fs::write(&path, &image.bytes).await.map_err(|err| {
        error!("failed to write upload {:?}: {}", path, err);
        ApiError::Internal
    })?;
    Ok(format!("/files/{}/{}", event_id, filename))
}

/// Best-effort removal of an event's upload directory, used when the event
/// insert rolls back after the image was already written.
pub async fn discard(upload_dir: &Path, event_id: Uuid) {
    let dir = upload_dir.join(event_id.to_string());
    if let Err(err) = fs::remove_dir_all(&dir).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to remove upload dir {:?}: {}", dir, err);
        }
    }
}

/// Reads a stored image back; an absent path is a 404, anything else a 500.
pub async fn load(upload_dir: &Path, event_id: Uuid, filename: &str) -> Result<Vec<u8>, ApiError> {
    let filename = sanitize_filename(filename)?;
    let path = stored_path(upload_dir, event_id, filename);
    match fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ApiError::FileNotFound),
        Err(err) => {
            error!("failed to read upload {:?}: {}", path, err);
            Err(ApiError::Internal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_filenames_are_rejected() {
        assert!(sanitize_filename("../../etc/passwd").is_err());
        assert!(sanitize_filename("a/b.png").is_err());
        assert!(sanitize_filename("a\\b.png").is_err());
        assert!(sanitize_filename(".hidden").is_err());
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("poster.png").is_ok());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("eventhub-test-{}", Uuid::new_v4()));
        let event_id = Uuid::new_v4();
        let image = ImageUpload {
            filename: "poster.png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        };
        let reference = save(&dir, event_id, &image).await.unwrap();
        assert_eq!(reference, format!("/files/{}/poster.png", event_id));
        let bytes = load(&dir, event_id, "poster.png").await.unwrap();
        assert_eq!(bytes, image.bytes);
        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn discard_removes_the_event_directory() {
        let dir = std::env::temp_dir().join(format!("eventhub-test-{}", Uuid::new_v4()));
        let event_id = Uuid::new_v4();
        let image = ImageUpload {
            filename: "poster.png".to_string(),
            bytes: vec![1, 2, 3],
        };
        save(&dir, event_id, &image).await.unwrap();
        discard(&dir, event_id).await;
        let res = load(&dir, event_id, "poster.png").await;
        assert!(matches!(res, Err(ApiError::FileNotFound)));
        fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn discarding_a_missing_directory_is_quiet() {
        let dir = std::env::temp_dir().join(format!("eventhub-test-{}", Uuid::new_v4()));
        discard(&dir, Uuid::new_v4()).await;
    }

    #[tokio::test]
    async fn missing_files_are_not_found() {
        let dir = std::env::temp_dir().join(format!("eventhub-test-{}", Uuid::new_v4()));
        let res = load(&dir, Uuid::new_v4(), "nope.png").await;
        assert!(matches!(res, Err(ApiError::FileNotFound)));
    }
}
