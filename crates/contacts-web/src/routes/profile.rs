//! Profile routes.

use axum::extract::State;
use axum::Json;
use base64::Engine;
use chrono::{DateTime, Utc};
use database::validation::validate_full_name;
use database::{profile, FieldError, Profile, ProfileField, ValidationError};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Largest accepted avatar image, after decoding.
const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Profile edit form.
#[derive(Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
}

/// Avatar upload as base64, optionally as a `data:` URL.
#[derive(Deserialize)]
pub struct AvatarUpload {
    pub data: String,
    /// Image type such as `image/png`; read from a `data:` URL when absent.
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Fetch the profile, creating it if this user has none yet.
pub async fn get_profile(State(state): State<AppState>, user: AuthUser) -> Result<Json<Profile>> {
    let profile = profile::ensure_profile(state.db.pool(), user.id(), &user.account.email).await?;
    Ok(Json(profile))
}

/// Update the display name. A blank name is refused.
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let full_name = update.full_name.trim();
    let checked = if full_name.is_empty() {
        Err(ValidationError::Empty("Name".to_string()))
    } else {
        validate_full_name(full_name)
    };
    checked.map_err(|err| ApiError::Validation(vec![FieldError::new("full_name", err)]))?;

    profile::ensure_profile(state.db.pool(), user.id(), &user.account.email).await?;
    profile::set_profile_field(state.db.pool(), user.id(), ProfileField::FullName, full_name)
        .await?;

    info!(account = %user.id(), "Profile updated");
    let profile = profile::ensure_profile(state.db.pool(), user.id(), &user.account.email).await?;
    Ok(Json(profile))
}

/// File extension for an image content type.
fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Split `data:image/png;base64,....` into its type and payload.
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    match data
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
    {
        Some((meta, payload)) => (meta.strip_suffix(";base64"), payload),
        None => (None, data),
    }
}

/// Storage key of an avatar uploaded at `at`.
fn avatar_key(user_id: &str, at: DateTime<Utc>, extension: &str) -> String {
    format!("{}/{}.{}", user_id, at.timestamp_millis(), extension)
}

/// Replace the avatar image and point the profile at its public URL.
///
/// The new image is stored as `<user-id>/<millis>.<ext>` before older
/// images in the user's folder are removed.
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    Json(upload): Json<AvatarUpload>,
) -> Result<Json<Profile>> {
    let (embedded_type, payload) = split_data_url(upload.data.trim());
    let content_type = upload
        .content_type
        .as_deref()
        .or(embedded_type)
        .unwrap_or("image/jpeg");
    let extension = image_extension(content_type)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported image type: {content_type}")))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| ApiError::BadRequest("Image data is not valid base64".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Image data is empty".to_string()));
    }
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(ApiError::BadRequest("Image is too large (max 5 MB)".to_string()));
    }

    profile::ensure_profile(state.db.pool(), user.id(), &user.account.email).await?;

    let key = avatar_key(user.id(), Utc::now(), extension);

    let previous: Vec<String> = state
        .avatars
        .list(user.id())
        .await?
        .into_iter()
        .filter(|existing| existing != &key)
        .collect();

    state.avatars.upload(&key, &bytes).await?;
    state.avatars.remove(&previous).await?;

    let url = state.avatars.public_url(&key);
    profile::set_profile_field(state.db.pool(), user.id(), ProfileField::AvatarUrl, &url).await?;

    info!(account = %user.id(), replaced = previous.len(), "Avatar updated");
    let profile = profile::ensure_profile(state.db.pool(), user.id(), &user.account.email).await?;
    Ok(Json(profile))
}
