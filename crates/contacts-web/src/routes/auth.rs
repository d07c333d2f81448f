//! Sign-up, sign-in and session routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use database::validation::{validate_email, validate_password};
use database::{account, profile, session, Account, DatabaseError, FieldError, Profile};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, new_token, verify_password, AuthUser};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Email and password credentials.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Public view of the signed-in account.
#[derive(Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
}

impl From<&Account> for UserInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
        }
    }
}

/// Returned after sign-up and sign-in.
#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserInfo,
    pub profile: Profile,
}

/// Returned for the current session.
#[derive(Serialize)]
pub struct CurrentSession {
    pub user: UserInfo,
    pub expires_at: String,
    pub profile: Profile,
}

fn check_credentials(credentials: &Credentials) -> Result<()> {
    let mut errors = Vec::new();
    if let Err(err) = validate_email(&credentials.email) {
        errors.push(FieldError::new("email", err));
    }
    if let Err(err) = validate_password(&credentials.password) {
        errors.push(FieldError::new("password", err));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

async fn open_session(state: &AppState, account: &Account, profile: Profile) -> Result<SessionResponse> {
    let (token, digest) = new_token();
    let session =
        session::create_session(state.db.pool(), &account.id, &digest, state.config.session_ttl)
            .await?;

    Ok(SessionResponse {
        token,
        expires_at: session.expires_at,
        user: account.into(),
        profile,
    })
}

/// Create an account, its profile and a first session.
///
/// If the profile cannot be created the account is removed again.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    check_credentials(&credentials)?;

    let password_hash = hash_password(credentials.password).await?;
    let account = match account::create_account(state.db.pool(), &credentials.email, &password_hash).await {
        Ok(account) => account,
        Err(DatabaseError::AlreadyExists { .. }) => {
            return Err(ApiError::Validation(vec![FieldError {
                field: "email",
                message: "An account with this email already exists".to_string(),
            }]))
        }
        Err(e) => return Err(e.into()),
    };

    let profile = match profile::ensure_profile(state.db.pool(), &account.id, &account.email).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(account = %account.id, "Profile creation failed, removing account: {}", e);
            if let Err(cleanup) = account::delete_account(state.db.pool(), &account.id).await {
                warn!(account = %account.id, "Failed to remove account: {}", cleanup);
            }
            return Err(e.into());
        }
    };

    info!(account = %account.id, "Account created");
    let response = open_session(&state, &account, profile).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Verify credentials and open a new session.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let account = match account::get_account_by_email(state.db.pool(), &credentials.email).await {
        Ok(account) => account,
        Err(e) if e.is_not_found() => return Err(invalid()),
        Err(e) => return Err(e.into()),
    };

    if !verify_password(credentials.password, account.password_hash.clone()).await? {
        return Err(invalid());
    }

    let profile = profile::ensure_profile(state.db.pool(), &account.id, &account.email).await?;
    info!(account = %account.id, "Signed in");
    Ok(Json(open_session(&state, &account, profile).await?))
}

/// End the current session.
pub async fn sign_out(State(state): State<AppState>, user: AuthUser) -> Result<StatusCode> {
    session::delete_session(state.db.pool(), &user.session.token_hash).await?;
    state.stores.evict(user.id()).await;
    info!(account = %user.id(), "Signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user, their profile and when the session ends.
pub async fn current_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CurrentSession>> {
    let profile = profile::ensure_profile(state.db.pool(), user.id(), &user.account.email).await?;
    Ok(Json(CurrentSession {
        user: (&user.account).into(),
        expires_at: user.session.expires_at,
        profile,
    }))
}
