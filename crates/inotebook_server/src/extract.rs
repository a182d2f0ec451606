//! Request extractors that reject with the JSON error envelope.

use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use inotebook_core::{AuthError, Principal, ServiceError};

/// JSON body; malformed input is a `VALIDATION` failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path parameters; unparsable ids are a `VALIDATION` failure.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Caller resolved from `Authorization: Bearer <token>`.
pub struct Authenticated(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map(str::to_owned).map_err(|_| {
                ApiError::from(ServiceError::from(AuthError::Malformed(
                    "authorization header is not valid text".to_string(),
                )))
            })?),
            None => None,
        };

        let principal = state
            .run(move |state, conn| state.accounts(conn)?.authenticate(header.as_deref()))
            .await?;
        Ok(Self(principal))
    }
}
