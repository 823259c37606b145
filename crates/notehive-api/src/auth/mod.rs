//! Bearer-token identity.
//!
//! Identity is a static table of (subject, token) pairs from configuration.
//! When `AUTH_REQUIRED` is off the header is optional, but a present header
//! must still carry a known token.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use notehive_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::HttpAppError;
use crate::state::{AppState, AuthState};

/// Identity of the requesting principal, when one was presented.
#[derive(Debug, Clone)]
pub struct OwnerIdentity(pub Option<String>);

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Resolve the Authorization header against the token table.
pub fn resolve_identity(
    auth: &AuthState,
    header: Option<&str>,
) -> Result<Option<String>, AppError> {
    let header = match header {
        Some(h) => h,
        None => {
            if auth.require_identity {
                return Err(AppError::Unauthorized(
                    "Missing authorization header".to_string(),
                ));
            }
            return Ok(None);
        }
    };

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    for (subject, expected) in &auth.tokens {
        if secure_compare(token, expected) {
            return Ok(Some(subject.clone()));
        }
    }

    Err(AppError::Unauthorized("Unknown bearer token".to_string()))
}

impl FromRequestParts<Arc<AppState>> for OwnerIdentity {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let identity = resolve_identity(&state.auth, header).map_err(HttpAppError::from)?;
        Ok(OwnerIdentity(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_state(require: bool) -> AuthState {
        AuthState {
            require_identity: require,
            tokens: vec![
                ("alice".to_string(), "s3cret".to_string()),
                ("bob".to_string(), "hunter2".to_string()),
            ],
        }
    }

    #[test]
    fn test_missing_header_is_anonymous_when_not_required() {
        let identity = resolve_identity(&auth_state(false), None).unwrap();
        assert_eq!(identity, None);
    }

    #[test]
    fn test_missing_header_rejected_when_required() {
        let err = resolve_identity(&auth_state(true), None).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_known_token_resolves_subject() {
        let identity = resolve_identity(&auth_state(true), Some("Bearer s3cret")).unwrap();
        assert_eq!(identity.as_deref(), Some("alice"));

        let identity = resolve_identity(&auth_state(false), Some("Bearer hunter2")).unwrap();
        assert_eq!(identity.as_deref(), Some("bob"));
    }

    #[test]
    fn test_unknown_token_rejected_even_when_optional() {
        let err = resolve_identity(&auth_state(false), Some("Bearer wrong")).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_malformed_header_rejected() {
        let err = resolve_identity(&auth_state(false), Some("Basic abc")).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
