use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::fmt;

use crate::errors::ApiError;

/// Header carrying the tenant ("óptica") identifier on every scoped request.
pub const TENANT_HEADER: &str = "X-Optica-Id";

/// Opaque per-request tenant identifier. Every query and mutation is
/// filtered by it; nothing in the system is reachable without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(TenantId::new)
            .ok_or_else(|| ApiError::BadRequest(format!("Missing {} header", TENANT_HEADER)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<TenantId, ApiError> {
        let (mut parts, _) = req.into_parts();
        TenantId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_and_trims_header() {
        let req = Request::builder()
            .header(TENANT_HEADER, " optica-001 ")
            .body(())
            .unwrap();
        let tenant = extract(req).await.unwrap();
        assert_eq!(tenant.as_str(), "optica-001");
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let req = Request::builder().body(()).unwrap();
        assert!(extract(req).await.is_err());
    }

    #[tokio::test]
    async fn blank_header_is_rejected() {
        let req = Request::builder()
            .header(TENANT_HEADER, "   ")
            .body(())
            .unwrap();
        assert!(extract(req).await.is_err());
    }
}
