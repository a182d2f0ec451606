//! `/api/user`: signup, login, profile, password reset, identity update,
//! account deletion.

use crate::error::ApiError;
use crate::extract::{AppJson, Authenticated};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::Router;
use inotebook_core::{ErrorCode, ResetPasswordRequest, SignupRequest, UpdateDetailsRequest};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/resetPassword", put(reset_password))
        .route("/updateDetails", put(update_details))
        .route("/deleteUser", delete(delete_user))
}

/// Phone numbers arrive either as text or as a bare JSON number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Phone {
    Text(String),
    Number(u64),
}

impl Phone {
    fn into_string(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Number(value) => value.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody {
    user_name: String,
    email: String,
    password: String,
    phone: Phone,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordBody {
    email: String,
    old_password: String,
    new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDetailsBody {
    user_name: String,
    old_email: String,
    new_email: String,
    phone: Phone,
    password: String,
}

async fn signup(
    State(state): State<AppState>,
    AppJson(body): AppJson<SignupBody>,
) -> Result<ApiResponse, ApiError> {
    let request = SignupRequest {
        user_name: body.user_name,
        email: body.email,
        password: body.password,
        phone: body.phone.into_string(),
    };
    let session = state
        .run(move |state, conn| state.accounts(conn)?.signup(&request))
        .await?;
    ApiResponse::created("User added successfully!").with("token", session.token)
}

async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginBody>,
) -> Result<ApiResponse, ApiError> {
    let session = state
        .run(move |state, conn| state.accounts(conn)?.login(&body.email, &body.password))
        .await
        .map_err(|err| match err.code() {
            // An unknown email is an authentication failure at this surface.
            ErrorCode::NotFound => ApiError::new(ErrorCode::CredentialMismatch, "Invalid email"),
            _ => err,
        })?;
    ApiResponse::ok("Login successful").with("token", session.token)
}

async fn profile(Authenticated(principal): Authenticated) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok("User verified successfully").with("user", principal)
}

async fn reset_password(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    AppJson(body): AppJson<ResetPasswordBody>,
) -> Result<ApiResponse, ApiError> {
    let request = ResetPasswordRequest {
        email: body.email,
        old_password: body.old_password,
        new_password: body.new_password,
    };
    state
        .run(move |state, conn| state.accounts(conn)?.reset_password(&principal, &request))
        .await?;
    Ok(ApiResponse::ok("Password reset successfully"))
}

async fn update_details(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    AppJson(body): AppJson<UpdateDetailsBody>,
) -> Result<ApiResponse, ApiError> {
    let request = UpdateDetailsRequest {
        user_name: body.user_name,
        old_email: body.old_email,
        new_email: body.new_email,
        phone: body.phone.into_string(),
        password: body.password,
    };
    let session = state
        .run(move |state, conn| state.accounts(conn)?.update_details(&principal, &request))
        .await?;
    ApiResponse::ok("User details updated successfully").with("token", session.token)
}

async fn delete_user(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<ApiResponse, ApiError> {
    let deletion = state
        .run(move |state, conn| {
            let images = state.images(conn)?;
            let stored = images.list(principal.id)?;
            let deletion = state.accounts(conn)?.delete_account(&principal)?;
            images.discard_blobs(&stored);
            Ok(deletion)
        })
        .await?;
    ApiResponse::ok("User and related notes deleted successfully")
        .with("notesRemoved", deletion.notes_removed)?
        .with("imagesRemoved", deletion.images_removed)
}
