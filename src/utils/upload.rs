//! On-disk storage for profile pictures.

use std::path::{Path, PathBuf};

use actix_web::web;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;

pub const PICTURE_FIELD: &str = "profilePicture";

/// Accepts any `image/*` content type.
pub fn validate_image(content_type: Option<&str>) -> Result<(), AppError> {
    match content_type {
        Some(ct) if ct.to_ascii_lowercase().starts_with("image/") => Ok(()),
        _ => Err(AppError::InvalidFileType),
    }
}

/// `profilePicture-<uuid><.ext>`, extension taken from the client filename
/// when it is short and alphanumeric.
pub fn unique_filename(original: Option<&str>) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{PICTURE_FIELD}-{}{ext}", Uuid::new_v4())
}

/// Resolves a stored reference inside `dir`, refusing anything that is not
/// a bare file name.
pub fn stored_path(dir: &Path, name: &str) -> Option<PathBuf> {
    let file_name = Path::new(name).file_name()?;
    if file_name != name {
        return None;
    }
    Some(dir.join(file_name))
}

/// Appends a chunk, failing once the total passes `limit`.
pub fn append_within_limit(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), AppError> {
    if buf.len() + chunk.len() > limit {
        return Err(AppError::FileTooLarge(limit));
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

pub async fn save(dir: &Path, name: &str, bytes: Vec<u8>) -> Result<(), AppError> {
    let path = stored_path(dir, name)
        .ok_or_else(|| AppError::Unhandled(format!("refusing to store under '{name}'")))?;

    web::block(move || std::fs::write(&path, bytes))
        .await?
        .map_err(|e| AppError::Unhandled(format!("failed to write upload {name}: {e}")))?;

    Ok(())
}

/// Deletes a stored file; failures are logged and otherwise ignored.
pub async fn remove_best_effort(dir: &Path, name: &str) {
    let Some(path) = stored_path(dir, name) else {
        warn!(name, "Stored picture reference is not a plain file name, not deleting");
        return;
    };

    match web::block(move || std::fs::remove_file(path)).await {
        Ok(Ok(())) => info!(name, "Deleted old profile picture"),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Ok(Err(e)) => warn!(name, error = %e, "Failed to delete old profile picture"),
        Err(e) => warn!(name, error = %e, "Failed to delete old profile picture"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_pass() {
        assert!(validate_image(Some("image/png")).is_ok());
        assert!(validate_image(Some("IMAGE/JPEG")).is_ok());
        assert!(matches!(
            validate_image(Some("application/pdf")),
            Err(AppError::InvalidFileType)
        ));
        assert!(matches!(validate_image(None), Err(AppError::InvalidFileType)));
    }

    #[test]
    fn generated_names_are_unique_and_keep_extension() {
        let a = unique_filename(Some("me.PNG"));
        let b = unique_filename(Some("me.PNG"));
        assert_ne!(a, b);
        assert!(a.starts_with("profilePicture-"));
        assert!(a.ends_with(".png"));

        assert!(!unique_filename(Some("noext")).contains('.'));
        assert!(!unique_filename(Some("x.p/ng")).contains('/'));
        assert!(!unique_filename(None).contains('.'));
    }

    #[test]
    fn stored_path_rejects_traversal() {
        let dir = Path::new("uploads");
        assert_eq!(
            stored_path(dir, "profilePicture-1.png"),
            Some(PathBuf::from("uploads/profilePicture-1.png"))
        );
        assert_eq!(stored_path(dir, "../etc/passwd"), None);
        assert_eq!(stored_path(dir, "a/b.png"), None);
        assert_eq!(stored_path(dir, ""), None);
    }

    #[test]
    fn size_limit_is_inclusive() {
        let mut buf = Vec::new();
        append_within_limit(&mut buf, &[0; 4], 5).unwrap();
        append_within_limit(&mut buf, &[0; 1], 5).unwrap();
        assert!(matches!(
            append_within_limit(&mut buf, &[0; 1], 5),
            Err(AppError::FileTooLarge(5))
        ));
        assert_eq!(buf.len(), 5);
    }

    #[actix_web::test]
    async fn save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "profilePicture-x.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("profilePicture-x.png")).unwrap(), vec![1, 2, 3]);

        remove_best_effort(dir.path(), "profilePicture-x.png").await;
        assert!(!dir.path().join("profilePicture-x.png").exists());

        // second delete is silent
        remove_best_effort(dir.path(), "profilePicture-x.png").await;
    }
}
