//! Storing uploaded files.

use std::path::{Path, PathBuf};

use {
    axum::extract::multipart::Field,
    tokio::{fs, io::AsyncWriteExt},
    tracing::debug,
    uuid::Uuid,
};

use crate::error::GatewayError;

const MAX_EXTENSION_LEN: usize = 16;

/// Server-chosen file name: a fresh UUID plus the client's extension when it
/// is short and alphanumeric. Nothing else from the client name is used.
pub fn stored_file_name(client_name: Option<&str>) -> String {
    let id = Uuid::new_v4();
    match client_name.and_then(client_extension) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

fn client_extension(name: &str) -> Option<String> {
    // client names may use either separator regardless of our platform
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Stream a multipart field to a new file under `dir`. A partially written
/// file is removed if the upload fails.
pub async fn store_field(mut field: Field<'_>, dir: &Path) -> Result<PathBuf, GatewayError> {
    let path = dir.join(stored_file_name(field.file_name()));
    let mut file = fs::File::create(&path).await?;

    let mut written = 0usize;
    let result: Result<(), GatewayError> = async {
        while let Some(chunk) = field.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if let Err(e) = result {
        drop(file);
        let _ = fs::remove_file(&path).await;
        return Err(e);
    }
    debug!(path = %path.display(), bytes = written, "stored upload");
    Ok(path)
}
