use std::{collections::HashMap, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    routes::AppState,
};

/// Resolves a bearer token to the id of the user it was issued to
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> AppResult<Uuid>;
}

#[derive(Debug, Deserialize)]
struct AuthUserResponse {
    id: Uuid,
}

/// Verifies tokens against a hosted Supabase-compatible auth service
pub struct SupabaseAuth {
    http_client: HttpClient,
    auth_url: String,
    anon_key: Option<String>,
}

impl SupabaseAuth {
    pub fn new(auth_url: String, anon_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            auth_url,
            anon_key,
        }
    }
}

#[async_trait]
impl AuthVerifier for SupabaseAuth {
    async fn verify(&self, token: &str) -> AppResult<Uuid> {
        let url = format!("{}/auth/v1/user", self.auth_url.trim_end_matches('/'));

        let mut request = self.http_client.get(&url).bearer_auth(token);
        if let Some(key) = &self.anon_key {
            request = request.header("apikey", key);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Token rejected by auth service");
            return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
        }

        let user: AuthUserResponse = response.json().await?;
        Ok(user.id)
    }
}

/// Fixed token table, for local runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    tokens: HashMap<String, Uuid>,
}

impl StaticAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: Uuid) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[async_trait]
impl AuthVerifier for StaticAuth {
    async fn verify(&self, token: &str) -> AppResult<Uuid> {
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
    }
}

/// The authenticated caller; rejects the request with 401 when absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let app_state = Arc::<AppState>::from_ref(state);
        let id = app_state.auth.verify(token).await?;

        Ok(AuthUser { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/library");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[tokio::test]
    async fn test_static_auth() {
        let user = Uuid::new_v4();
        let auth = StaticAuth::new().with_token("good", user);
        assert_eq!(auth.verify("good").await.unwrap(), user);
        assert!(matches!(
            auth.verify("bad").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_auth_service_is_an_error() {
        let auth = SupabaseAuth::new("http://127.0.0.1:1".to_string(), None);
        assert!(auth.verify("token").await.is_err());
    }
}
