//! Identity extraction for requests forwarded by the authentication
//! gateway.
//!
//! Credential verification and token issuance live outside this service;
//! the gateway strips any client-supplied identity headers and installs
//! verified claims before forwarding. This middleware only reconstructs the
//! [`Principal`] from those trusted headers and rejects requests without
//! them.

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use taskhive_application::RequestContext;
use taskhive_core::{AppError, OrganizationId, Principal, UserId};
use uuid::Uuid;

use crate::error::ApiResult;

const SUBJECT_HEADER: &str = "x-auth-subject";
const ORGANIZATION_HEADER: &str = "x-auth-organization";
const ROLES_HEADER: &str = "x-auth-roles";
const ISSUED_AT_HEADER: &str = "x-auth-issued-at";
const EXPIRES_AT_HEADER: &str = "x-auth-expires-at";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Requires a verified identity on the request and exposes it as a
/// [`Principal`] extension, alongside the transport [`RequestContext`].
pub async fn require_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let principal = principal_from_headers(request.headers())?;

    if principal.is_expired_at(Utc::now()) {
        return Err(AppError::Unauthorized("identity token has expired".to_owned()).into());
    }

    let context = request_context(request.headers());
    request.extensions_mut().insert(principal);
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, AppError> {
    let subject_id = UserId::from_uuid(required_uuid(headers, SUBJECT_HEADER)?);
    let organization_id =
        OrganizationId::from_uuid(required_uuid(headers, ORGANIZATION_HEADER)?);
    let issued_at = required_timestamp(headers, ISSUED_AT_HEADER)?;
    let expires_at = required_timestamp(headers, EXPIRES_AT_HEADER)?;

    let roles = headers
        .get(ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(|role| role.trim().to_owned())
                .filter(|role| !role.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(Principal::new(
        subject_id,
        organization_id,
        roles,
        issued_at,
        expires_at,
    ))
}

fn required_uuid(headers: &HeaderMap, name: &str) -> Result<Uuid, AppError> {
    let value = headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing identity header '{name}'")))?;

    Uuid::parse_str(value)
        .map_err(|_| AppError::Unauthorized(format!("malformed identity header '{name}'")))
}

fn required_timestamp(headers: &HeaderMap, name: &str) -> Result<DateTime<Utc>, AppError> {
    let value = headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing identity header '{name}'")))?;

    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| AppError::Unauthorized(format!("malformed identity header '{name}'")))
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let ip_address = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned());
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    RequestContext {
        ip_address,
        user_agent,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::principal_from_headers;

    #[test]
    fn rejects_missing_and_malformed_headers() {
        let mut headers = HeaderMap::new();
        assert!(principal_from_headers(&headers).is_err());

        if let Ok(value) = "not-a-uuid".parse() {
            headers.insert(super::SUBJECT_HEADER, value);
        }
        assert!(principal_from_headers(&headers).is_err());
    }

    #[test]
    fn builds_a_principal_from_complete_headers() {
        let mut headers = HeaderMap::new();
        let issued_at = Utc::now();
        let entries = [
            (super::SUBJECT_HEADER, Uuid::new_v4().to_string()),
            (super::ORGANIZATION_HEADER, Uuid::new_v4().to_string()),
            (super::ROLES_HEADER, "owner, admin".to_owned()),
            (super::ISSUED_AT_HEADER, issued_at.to_rfc3339()),
            (
                super::EXPIRES_AT_HEADER,
                (issued_at + Duration::minutes(30)).to_rfc3339(),
            ),
        ];
        for (name, value) in entries {
            if let Ok(value) = value.parse() {
                headers.insert(name, value);
            }
        }

        let principal = principal_from_headers(&headers);
        let Ok(principal) = principal else {
            return assert!(principal.is_ok());
        };
        assert_eq!(principal.roles(), ["owner".to_owned(), "admin".to_owned()]);
    }
}
