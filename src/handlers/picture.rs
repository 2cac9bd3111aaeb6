use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::WalletError;
use crate::middleware::AuthUser;
use crate::router::AppState;
use crate::service::pictures::{self, UploadRequest, UploadedFile};

pub async fn upload_picture_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    WithRejection(mut multipart, _): WithRejection<Multipart, WalletError>,
) -> Result<Response, WalletError> {
    let mut req = UploadRequest::default();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                req.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("name") => req.name = Some(field.text().await?),
            _ => {}
        }
    }
    let picture = pictures::upload_picture(&state.storage, &state.pictures, req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "picture": picture }))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

pub async fn search_pictures_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, WalletError> {
    let found = pictures::search_pictures(&state.storage, query.name.as_deref()).await?;
    Ok(Json(json!({ "pictures": found })))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeletePictureRequest {
    pub path: Option<String>,
}

pub async fn delete_picture_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<DeletePictureRequest>, WalletError>,
) -> Result<Json<Value>, WalletError> {
    let report =
        pictures::delete_picture(&state.storage, &state.pictures, req.path.as_deref()).await?;
    Ok(Json(json!({
        "message": "Deletion completed successfully",
        "deletedFromDisk": report.deleted_from_disk,
        "deletedFromDatabase": report.deleted_from_database,
    })))
}
