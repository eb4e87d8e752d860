//! Local staging of multipart uploads. Accepted files land under the
//! configured upload directory with collision-free generated names; the
//! ingestion workflow owns their lifecycle from the moment a fully parsed
//! form is returned.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, Multipart};
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;

/// Per-file upload cap, matching the public API contract.
pub const MAX_UPLOAD_BYTES: u64 = 10_000_000;

/// Multipart field names for the two book assets.
pub const COVER_FIELD: &str = "coverImage";
pub const FILE_FIELD: &str = "file";

/// A file accepted from the request and written to a transient local
/// location. Addressable only within the current request's lifetime.
#[derive(Debug)]
pub struct StagedFile {
    /// Client-supplied filename, informational only.
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub path: PathBuf,
}

/// Parsed `POST /books` / `PATCH /books/:id` form: text fields plus at most
/// one staged file per asset field.
#[derive(Debug, Default)]
pub struct BookUploadForm {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub cover_image: Option<StagedFile>,
    pub file: Option<StagedFile>,
}

impl BookUploadForm {
    pub fn staged(&self) -> impl Iterator<Item = &StagedFile> {
        self.cover_image.iter().chain(self.file.iter())
    }
}

/// Parse the multipart body, staging `coverImage` and `file` to `dir`.
/// Enforces the per-file size cap and at most one file per field. If parsing
/// fails partway, everything staged so far is removed before returning.
pub async fn stage_book_form(mut mp: Multipart, dir: &Path) -> Result<BookUploadForm, AppError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("create upload dir {:?}: {}", dir, e))?;

    let mut form = BookUploadForm::default();
    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard_form(&form).await;
                return Err(AppError::Validation(format!("invalid multipart body: {e}")));
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        let result = match name.as_str() {
            "title" => read_text(field).await.map(|v| form.title = Some(v)),
            "genre" => read_text(field).await.map(|v| form.genre = Some(v)),
            COVER_FIELD => stage_file(field, dir, &mut form.cover_image, COVER_FIELD).await,
            FILE_FIELD => stage_file(field, dir, &mut form.file, FILE_FIELD).await,
            // Unknown fields are drained and ignored.
            _ => Ok(()),
        };
        if let Err(e) = result {
            discard_form(&form).await;
            return Err(e);
        }
    }
    Ok(form)
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))
}

async fn stage_file(
    mut field: Field<'_>,
    dir: &Path,
    slot: &mut Option<StagedFile>,
    field_name: &str,
) -> Result<(), AppError> {
    if slot.is_some() {
        return Err(AppError::Validation(format!(
            "only one file is allowed in field '{field_name}'"
        )));
    }

    let file_name = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".into());
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".into());
    let stored = format!("{}.{}", Uuid::new_v4(), ext_for(&file_name, &content_type));
    let path = dir.join(stored);

    let mut out = tokio::fs::File::create(&path)
        .await
        .map_err(|e| anyhow::anyhow!("create staged file {:?}: {}", path, e))?;

    let mut size: u64 = 0;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                remove_staged(&path).await;
                return Err(AppError::Validation(format!("invalid multipart body: {e}")));
            }
        };
        size += chunk.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            remove_staged(&path).await;
            return Err(AppError::Validation(format!(
                "file in field '{field_name}' exceeds the {MAX_UPLOAD_BYTES} byte limit"
            )));
        }
        if let Err(e) = out.write_all(&chunk).await {
            remove_staged(&path).await;
            return Err(anyhow::anyhow!("write staged file {:?}: {}", path, e).into());
        }
    }
    if let Err(e) = out.flush().await {
        remove_staged(&path).await;
        return Err(anyhow::anyhow!("flush staged file {:?}: {}", path, e).into());
    }

    *slot = Some(StagedFile {
        file_name,
        content_type,
        size,
        path,
    });
    Ok(())
}

/// Remove a staged file, logging (not failing) when the file is already gone
/// or the filesystem refuses. A leftover local file only costs disk space;
/// the request outcome is decided elsewhere.
pub async fn remove_staged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove staged file");
        }
    }
}

async fn discard_form(form: &BookUploadForm) {
    for staged in form.staged() {
        remove_staged(&staged.path).await;
    }
}

/// Extension for the stored name: prefer the client filename's extension,
/// fall back to the declared MIME type.
fn ext_for(file_name: &str, content_type: &str) -> String {
    if let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) {
        if !ext.is_empty() {
            return ext.to_ascii_lowercase();
        }
    }
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "bin",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_prefers_filename_extension() {
        assert_eq!(ext_for("cover.JPG", "application/octet-stream"), "jpg");
        assert_eq!(ext_for("dune.pdf", "application/pdf"), "pdf");
    }

    #[test]
    fn ext_falls_back_to_mime() {
        assert_eq!(ext_for("upload", "image/jpeg"), "jpg");
        assert_eq!(ext_for("upload", "image/png"), "png");
        assert_eq!(ext_for("upload", "image/webp"), "webp");
        assert_eq!(ext_for("upload", "application/pdf"), "pdf");
        assert_eq!(ext_for("upload", "application/octet-stream"), "bin");
    }

    #[test]
    fn form_staged_iterates_present_files() {
        let form = BookUploadForm {
            title: Some("Dune".into()),
            genre: None,
            cover_image: Some(StagedFile {
                file_name: "cover.jpg".into(),
                content_type: "image/jpeg".into(),
                size: 3,
                path: PathBuf::from("/tmp/a.jpg"),
            }),
            file: None,
        };
        let staged: Vec<_> = form.staged().collect();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].file_name, "cover.jpg");
    }

    #[tokio::test]
    async fn remove_staged_tolerates_missing_file() {
        // Must not panic or error when the path does not exist.
        remove_staged(Path::new("/tmp/ebookshelf-definitely-missing")).await;
    }
}
