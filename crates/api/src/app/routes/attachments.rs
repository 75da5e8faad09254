use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
};

use pdfrelay_attachments::{
    AttachmentFile, AttachmentStore, AttachmentType, Folder, NewAttachment, ProtectionMode,
};
use pdfrelay_core::{AttachmentId, FolderId, UserId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn create_folder(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateFolderRequest>,
) -> axum::response::Response {
    let protection = match body.restricted_to {
        Some(allowed) => ProtectionMode::Restricted { allowed },
        None => ProtectionMode::Public,
    };

    let id = match services.store.create_folder(Folder::new(body.title, protection)) {
        Ok(id) => id,
        Err(e) => return errors::store_error_to_response(e),
    };

    (StatusCode::CREATED, Json(dto::CreateFolderResponse { id })).into_response()
}

pub async fn upload(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Multipart,
) -> axum::response::Response {
    let upload = match parse_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let attachment = match services.store.insert(upload) {
        Ok(attachment) => attachment,
        Err(e) => return errors::store_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        Json(dto::UploadResponse { id: attachment.id }),
    )
        .into_response()
}

pub async fn convert(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AttachmentId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid attachment id");
        }
    };

    let attachment = match services.store.get(id) {
        Ok(Some(attachment)) if !attachment.is_deleted => attachment,
        Ok(_) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "attachment not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = services.start_conversion(&attachment).await {
        return errors::cache_error_to_response(e);
    }

    (
        StatusCode::ACCEPTED,
        Json(dto::ConvertResponse { id, state: "pending" }),
    )
        .into_response()
}

/// Pull the upload form out of the multipart body.
///
/// Fields: `folder` (folder id), `owner` (user id), `title`, optional
/// `description`, and the `file` part carrying name/type/bytes.
async fn parse_upload(mut multipart: Multipart) -> Result<NewAttachment, axum::response::Response> {
    let mut folder_id: Option<FolderId> = None;
    let mut owner: Option<UserId> = None;
    let mut title: Option<String> = None;
    let mut description = String::new();
    let mut file: Option<AttachmentFile> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("folder") => {
                let value = text(field).await?;
                folder_id = Some(parse_field("folder", &value)?);
            }
            Some("owner") => {
                let value = text(field).await?;
                owner = Some(parse_field("owner", &value)?);
            }
            Some("title") => title = Some(text(field).await?),
            Some("description") => description = text(field).await?,
            Some("file") => {
                let filename = field.file_name().unwrap_or("attachment").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.to_string())
                    })?
                    .to_vec();
                file = Some(AttachmentFile { filename, content_type, data });
            }
            _ => {}
        }
    }

    let (Some(folder_id), Some(owner), Some(title), Some(file)) = (folder_id, owner, title, file)
    else {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_field",
            "folder, owner, title and file are required",
        ));
    };

    Ok(NewAttachment {
        folder_id,
        owner,
        title,
        description,
        kind: AttachmentType::File,
        file,
    })
}

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, axum::response::Response> {
    multipart.next_field().await.map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.to_string())
    })
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, axum::response::Response> {
    field.text().await.map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.to_string())
    })
}

fn parse_field<T: std::str::FromStr>(
    name: &'static str,
    value: &str,
) -> Result<T, axum::response::Response> {
    value.trim().parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_field",
            format!("invalid value for {name}"),
        )
    })
}
