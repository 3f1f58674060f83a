use axum::http::{HeaderMap, StatusCode, request::Parts};
use serde::Serialize;

use crate::{
    App,
    config::ServerConfig,
    error::{ApiRequestError, AppError},
};

// Set by the authenticating reverse proxy in front of this service, which
// strips any client supplied value
pub const USER_ID_HEADER: &str = "x-auth-user-id";
pub const USER_NAME_HEADER: &str = "x-auth-user-name";
pub const USER_IMAGE_HEADER: &str = "x-auth-user-image";

#[derive(thiserror::Error, Debug)]
pub enum AuthenticationError {
    #[error("Authentication required, but no `{USER_ID_HEADER}` header found.")]
    NoIdentity,

    #[error("You are not allowed to access this resource.")]
    Forbidden,
}

impl ApiRequestError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthenticationError::NoIdentity => StatusCode::UNAUTHORIZED,
            AuthenticationError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl Identity {
    fn from_headers(headers: &HeaderMap) -> Result<Self, AuthenticationError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Identity {
            id: header(USER_ID_HEADER).ok_or(AuthenticationError::NoIdentity)?,
            name: header(USER_NAME_HEADER),
            image: header(USER_IMAGE_HEADER),
        })
    }

    /// Admins may modify any entry, everyone else only their own.
    pub fn can_modify(&self, author_id: &str, config: &ServerConfig) -> bool {
        self.id == author_id || config.is_admin(&self.id)
    }
}

pub struct MaybeAuthUser(pub Result<Identity, AuthenticationError>);

impl axum::extract::FromRequestParts<App> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &App) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(Identity::from_headers(&parts.headers)))
    }
}

pub struct AuthUser(pub Identity);

impl axum::extract::FromRequestParts<App> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let MaybeAuthUser(auth_user) = MaybeAuthUser::from_request_parts(parts, state).await?;

        Ok(AuthUser(auth_user?))
    }
}

/// An authenticated user listed in `GUEST_BOOK_ADMIN_USER_IDS`.
pub struct AdminUser(pub Identity);

impl axum::extract::FromRequestParts<App> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;

        if !state.config.is_admin(&identity.id) {
            tracing::warn!(user_id = %identity.id, "Non-admin tried to reach an admin endpoint");
            return Err(AuthenticationError::Forbidden.into());
        }

        Ok(AdminUser(identity))
    }
}
