//! 上传接口的 Basic 认证守卫。

use axum::extract::Extension;
use axum::http::{HeaderValue, Request, header};
use axum::{body::Body as AxumBody, middleware, response::Response};
use axum_extra::headers::{Authorization, Header, authorization::Basic};
use std::sync::Arc;
use tracing::warn;

use crate::config::UPLOAD_PATH;
use crate::error::ApiError;

const BASIC_PREFIX: &[u8] = b"Basic ";

/// Static credentials for the upload endpoint. Unset values never match.
#[derive(Debug, Default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    pub fn is_configured(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        self.username.as_deref() == Some(username) && self.password.as_deref() == Some(password)
    }
}

/// 认证中间件：仅对上传路径校验 Basic 凭据。
pub async fn auth_middleware(
    Extension(auth): Extension<Arc<AuthConfig>>,
    req: Request<AxumBody>,
    next: middleware::Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path();
    if !is_protected_path(path) {
        return Ok(next.run(req).await);
    }

    if let Err(err) = verify_credentials(&auth, req.headers().get(header::AUTHORIZATION)) {
        warn!(path, "upload rejected by auth guard");
        return Err(err);
    }
    Ok(next.run(req).await)
}

fn is_protected_path(path: &str) -> bool {
    path.starts_with(UPLOAD_PATH)
}

/// 校验 Authorization 头：缺失或非 Basic 返回 401，凭据错误返回 403。
pub fn verify_credentials(auth: &AuthConfig, value: Option<&HeaderValue>) -> Result<(), ApiError> {
    let Some(value) = value.filter(|value| value.as_bytes().starts_with(BASIC_PREFIX)) else {
        return Err(ApiError::Unauthenticated);
    };

    let credentials = Authorization::<Basic>::decode(&mut std::iter::once(value))
        .map_err(|_| ApiError::Forbidden)?;
    if auth.matches(credentials.username(), credentials.password()) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
