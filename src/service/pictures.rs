use crate::db::{DbPicture, PictureRepository, PictureView, WalletStorage};
use crate::error::WalletError;
use crate::service::similarity::{SIMILARITY_THRESHOLD, similarity};
use crate::service::validation::{required, validate_picture_name};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// URL prefix under which `upload_dir` is served.
pub const PUBLIC_PREFIX: &str = "/public/";
const SUGGESTIONS_DIR: &str = "suggestions";
const MAX_SEARCH_RESULTS: usize = 20;

/// File part of an upload as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub name: Option<String>,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoundPicture {
    pub name: String,
    pub path: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeletionReport {
    #[serde(rename = "deletedFromDisk")]
    pub deleted_from_disk: bool,
    #[serde(rename = "deletedFromDatabase")]
    pub deleted_from_database: bool,
}

/// On-disk location of uploaded pictures.
#[derive(Debug, Clone)]
pub struct PictureStore {
    upload_dir: PathBuf,
    max_bytes: usize,
}

impl PictureStore {
    pub fn new(upload_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Map a public URL path onto the upload root; `None` if it would escape it.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let rel = Path::new(public_path.strip_prefix(PUBLIC_PREFIX)?);
        let mut out = self.upload_dir.clone();
        let mut depth = 0;
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    out.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        (depth > 0).then_some(out)
    }
}

/// Lower-cased file name `<name>-<millis>-<random>.<ext>` with unsafe characters replaced.
fn stored_file_name(name: &str, extension: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!(
        "{stem}-{}-{suffix}.{extension}",
        Utc::now().timestamp_millis()
    )
    .to_lowercase()
}

fn extension_for(file: &UploadedFile, content_type: &str) -> String {
    file.file_name
        .as_deref()
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_owned)
        .unwrap_or_else(|| {
            if content_type == "image/png" {
                "png".to_string()
            } else {
                "jpg".to_string()
            }
        })
}

pub async fn upload_picture(
    storage: &WalletStorage,
    store: &PictureStore,
    req: UploadRequest,
) -> Result<PictureView, WalletError> {
    let file = req.file.ok_or(WalletError::NoFileProvided)?;
    let name = required(req.name.as_deref())
        .ok_or(WalletError::InvalidInput("Name is required"))?
        .to_string();
    let content_type = file.content_type.as_deref().unwrap_or_default();
    if !matches!(content_type, "image/png" | "image/jpeg") {
        return Err(WalletError::InvalidFileType);
    }
    if file.bytes.len() > store.max_bytes {
        return Err(WalletError::FileTooLarge(store.max_bytes.div_ceil(1024 * 1024)));
    }
    validate_picture_name(&name)?;

    let mut conn = storage.acquire().await?;
    if conn.find_picture_by_name(&name).await?.is_some() {
        return Err(WalletError::DuplicatePictureName);
    }

    let file_name = stored_file_name(&name, &extension_for(&file, content_type));
    let dir = store.upload_dir.join(SUGGESTIONS_DIR);
    tokio::fs::create_dir_all(&dir).await?;
    let disk_path = dir.join(&file_name);
    tokio::fs::write(&disk_path, &file.bytes).await?;

    let picture = DbPicture {
        picture_id: Uuid::new_v4().to_string(),
        name,
        path: format!("{PUBLIC_PREFIX}{SUGGESTIONS_DIR}/{file_name}"),
        created_at: Utc::now(),
    };
    if let Err(e) = conn.insert_picture(&picture).await {
        if let Err(rm) = tokio::fs::remove_file(&disk_path).await {
            warn!(path = %disk_path.display(), error = %rm, "failed to remove orphaned upload");
        }
        return Err(e);
    }
    info!(picture_id = %picture.picture_id, path = %picture.path, "picture uploaded");
    Ok(picture.into())
}

/// Pictures whose name is trigram-similar to `name`, best match first.
pub async fn search_pictures(
    storage: &WalletStorage,
    name: Option<&str>,
) -> Result<Vec<FoundPicture>, WalletError> {
    let query = required(name).ok_or(WalletError::InvalidNameInput)?;

    let mut conn = storage.acquire().await?;
    let mut found: Vec<FoundPicture> = conn
        .list_pictures()
        .await?
        .into_iter()
        .filter_map(|p| {
            let score = similarity(&p.name, query);
            (score > SIMILARITY_THRESHOLD).then_some(FoundPicture {
                name: p.name,
                path: p.path,
                score,
            })
        })
        .collect();
    found.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    found.truncate(MAX_SEARCH_RESULTS);

    if found.is_empty() {
        return Err(WalletError::PicturesNotFound);
    }
    Ok(found)
}

/// Lower-case, drop `..` sequences and collapse repeated slashes.
pub fn sanitize_public_path(path: &str) -> String {
    let mut out = path.to_lowercase().replace("..", "");
    while out.contains("//") {
        out = out.replace("//", "/");
    }
    out
}

pub async fn delete_picture(
    storage: &WalletStorage,
    store: &PictureStore,
    path: Option<&str>,
) -> Result<DeletionReport, WalletError> {
    let path = required(path).ok_or(WalletError::NoPathProvided)?;
    let sanitized = sanitize_public_path(path.trim());
    let disk_path = store.resolve(&sanitized).ok_or(WalletError::NoPathProvided)?;

    let mut conn = storage.acquire().await?;
    let record = conn.find_picture_by_path(&sanitized).await?;
    let on_disk = tokio::fs::metadata(&disk_path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);

    if !on_disk && record.is_none() {
        return Err(WalletError::NothingToDelete);
    }
    if on_disk {
        tokio::fs::remove_file(&disk_path)
            .await
            .map_err(WalletError::FileDeletionFailed)?;
    }
    if let Some(record) = &record {
        conn.delete_picture(&record.picture_id).await?;
    }
    info!(path = %sanitized, on_disk, in_db = record.is_some(), "picture deleted");
    Ok(DeletionReport {
        deleted_from_disk: on_disk,
        deleted_from_database: record.is_some(),
    })
}
