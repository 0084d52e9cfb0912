//! Token authentication (§4.7): the `Authorization` header is looked up in
//! the in-memory user database; per-request the resolved user is threaded
//! explicitly through every handler, never stashed in shared state (§9).

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::User;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        state.users.lookup(token).map(AuthUser).ok_or(ApiError::Unauthorized)
    }
}
