//! 单文件上传处理器：分类目录、文件命名与 URL 生成。

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Extension, Multipart, Query};
use axum::response::Json as JsonResponse;
use futures_util::stream::StreamExt;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::atomic::AtomicFile;
use crate::config::{DEFAULT_CATEGORY, MEDIA_PATH, UPLOAD_FIELD};
use crate::error::ApiError;
use crate::naming::generate_stored_name;
use crate::storage::Storage;

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug)]
pub struct UploadConfig {
    pub public_base_url: String,
}

impl UploadConfig {
    /// Public URL under which the retrieval route serves a stored file.
    ///
    /// Segments are percent-encoded; the static file service decodes them back
    /// to the on-disk names.
    pub fn media_url(&self, category: &str, name: &str) -> String {
        format!(
            "{}{MEDIA_PATH}/{}/{}",
            self.public_base_url,
            utf8_percent_encode(category, PATH_SEGMENT),
            utf8_percent_encode(name, PATH_SEGMENT)
        )
    }
}

#[derive(Deserialize)]
pub(crate) struct UploadQuery {
    category: Option<String>,
}

impl UploadQuery {
    fn category(&self) -> &str {
        match self.category.as_deref() {
            Some(category) if !category.is_empty() => category,
            _ => DEFAULT_CATEGORY,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct UploadResponse {
    url: String,
}

struct StoredFile {
    name: String,
    path: PathBuf,
    size: u64,
}

/// 接收 multipart 中的 `file` 字段并写入分类目录。
pub async fn upload_file(
    Query(query): Query<UploadQuery>,
    Extension(storage): Extension<Arc<Storage>>,
    Extension(upload): Extension<Arc<UploadConfig>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<JsonResponse<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|err| {
        debug!(error = %err, "upload body is not multipart");
        ApiError::no_file()
    })?;
    let category = query.category();
    let mut stored: Option<StoredFile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                discard(stored).await;
                return Err(invalid_multipart(err));
            }
        };
        // Parts without a filename are plain form fields, an empty one is an unselected input.
        let Some(original) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };
        if field.name() != Some(UPLOAD_FIELD) || stored.is_some() {
            discard(stored).await;
            warn!(
                category,
                field = field.name().unwrap_or_default(),
                "unexpected file part in upload request"
            );
            return Err(ApiError::BadRequest("Unexpected field".into()));
        }

        let dir = storage.resolve_category(category).await?;
        let name = generate_stored_name(&original);
        let path = dir.join(&name);
        let size = persist_field(field, &path).await?;
        debug!(category, original = %original, name = %name, size, "upload field stored");
        stored = Some(StoredFile { name, path, size });
    }

    let Some(file) = stored else {
        return Err(ApiError::no_file());
    };
    info!(category, name = %file.name, size = file.size, "file uploaded");
    Ok(JsonResponse(UploadResponse {
        url: upload.media_url(category, &file.name),
    }))
}

async fn persist_field(mut field: Field<'_>, path: &std::path::Path) -> Result<u64, ApiError> {
    let mut atomic = AtomicFile::new(path).await?;
    while let Some(chunk) = field.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                atomic.cleanup().await;
                return Err(invalid_multipart(err));
            }
        };
        if chunk.is_empty() {
            continue;
        }
        if let Err(err) = atomic.write_chunk(&chunk).await {
            atomic.cleanup().await;
            return Err(err.into());
        }
    }
    debug!(bytes = atomic.written(), "upload stream drained");
    Ok(atomic.finalize().await?)
}

async fn discard(stored: Option<StoredFile>) {
    if let Some(file) = stored {
        let _ = fs::remove_file(&file.path).await;
    }
}

fn invalid_multipart(err: MultipartError) -> ApiError {
    debug!(error = %err, "invalid multipart body");
    ApiError::BadRequest("Invalid multipart body".into())
}
