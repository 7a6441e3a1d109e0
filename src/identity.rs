//! Identity collaborator glue.
//!
//! Sign-in itself is delegated to an external identity provider; requests
//! reach this backend with proxy-injected identity headers. The extractor
//! below turns them into a [`UserProfile`] and rejects requests that carry
//! no uid.

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};

use crate::error::AppError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_NAME_HEADER: &str = "x-user-name";
const USER_EMAIL_HEADER: &str = "x-user-email";

/// Identity of a signed-in user as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable user identifier.
    pub uid: String,
    /// Display name, when the provider knows one.
    pub display_name: Option<String>,
    /// Email address, when the provider shares it.
    pub email: Option<String>,
}

impl UserProfile {
    /// Name shown next to the user's messages: display name, then email,
    /// then the raw uid.
    pub fn username(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Extractor yielding the authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uid = header_string(&parts.headers, USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing identity".into()))?;

        Ok(CurrentUser(UserProfile {
            uid,
            display_name: header_string(&parts.headers, USER_NAME_HEADER),
            email: header_string(&parts.headers, USER_EMAIL_HEADER),
        }))
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
