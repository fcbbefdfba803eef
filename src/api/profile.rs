use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    services::users,
    utils::upload::{self, PICTURE_FIELD},
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::{StreamExt, TryStreamExt};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info, instrument};

struct Upload {
    original_name: Option<String>,
    bytes: Vec<u8>,
}

/// Pulls the `profilePicture` field out of the form, checking type and size
/// while streaming. Other fields are drained and ignored.
async fn read_picture(payload: &mut Multipart, limit: usize) -> Result<Option<Upload>, AppError> {
    let mut picture = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {e}")))?;

        if field.name() != PICTURE_FIELD || picture.is_some() {
            while field
                .try_next()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {e}")))?
                .is_some()
            {}
            continue;
        }

        upload::validate_image(field.content_type().map(|m| m.essence_str()))?;
        let original_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {e}")))?
        {
            upload::append_within_limit(&mut bytes, &chunk, limit)?;
        }

        picture = Some(Upload {
            original_name,
            bytes,
        });
    }

    Ok(picture)
}

/// Update own profile picture
#[utoipa::path(
    post,
    path = "/api/profile/update-picture",
    request_body(content = String, description = "multipart/form-data with a `profilePicture` image field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture stored", body = Object, example = json!({
            "message": "Profile picture updated successfully!",
            "profilePictureUrl": "profilePicture-1b4e28ba-2fa1-11d2-883f-0016d3cca427.png"
        })),
        (status = 400, description = "No file or not an image"),
        (status = 413, description = "File too large")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
#[instrument(name = "profile_update_picture", skip_all, fields(user_id = auth.user_id))]
pub async fn update_picture(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let Some(picture) = read_picture(&mut payload, config.max_upload_bytes).await? else {
        return Err(AppError::InvalidInput(
            "No profile picture file uploaded.".to_string(),
        ));
    };

    let previous = users::find_by_id(pool.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found.", auth.user_id)))?
        .profile_picture_url;

    let filename = upload::unique_filename(picture.original_name.as_deref());
    upload::save(&config.upload_dir, &filename, picture.bytes).await?;

    // Reference first; the old file only goes once nothing points at it.
    if let Err(e) = users::set_profile_picture(pool.get_ref(), auth.user_id, &filename).await {
        error!(error = %e, %filename, "Failed to store picture reference, removing upload");
        upload::remove_best_effort(&config.upload_dir, &filename).await;
        return Err(e);
    }

    if let Some(old) = previous.filter(|old| *old != filename) {
        upload::remove_best_effort(&config.upload_dir, &old).await;
    }

    info!(%filename, "Profile picture updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile picture updated successfully!",
        "profilePictureUrl": filename
    })))
}
