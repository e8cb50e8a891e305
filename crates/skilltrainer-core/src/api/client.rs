//! API client for communicating with the SkillTrainer REST API.
//!
//! This module provides the `ApiClient` struct. Every request goes through
//! [`ApiClient::send`], which attaches the stored bearer token and, on a 401,
//! refreshes the access token once and replays the request.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::{CredentialPair, Session};
use crate::config::Config;
use crate::models::{LoginResponse, ProfileUpdate, RefreshResponse, RegisterRequest, ServerStatus, User};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds when no config is supplied
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default refresh endpoint, relative to the base URL
const REFRESH_PATH: &str = "/auth/token/refresh/";

/// A request is replayed at most this many times after a token refresh
const MAX_AUTH_RETRIES: u32 = 1;

// ============================================================================
// Request descriptor
// ============================================================================

/// Request payload, held as owned data so every attempt can rebuild it.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

/// Multipart form kept as plain parts.
///
/// A `reqwest::multipart::Form` is consumed when sent, so a fresh form is
/// built from these parts for the first attempt and again for a replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

#[derive(Clone, PartialEq)]
struct FilePart {
    name: String,
    file_name: String,
    mime: Option<String>,
    bytes: Arc<[u8]>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        self.files.push(FilePart {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.map(str::to_string),
            bytes: bytes.into(),
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn file_len(&self, name: &str) -> Option<usize> {
        self.files.iter().find(|f| f.name == name).map(|f| f.bytes.len())
    }

    fn to_form(&self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
            if let Some(ref mime) = file.mime {
                part = part
                    .mime_str(mime)
                    .map_err(|_| ApiError::InvalidRequest(format!("Invalid content type: {}", mime)))?;
            }
            form = form.part(file.name.clone(), part);
        }
        Ok(form)
    }
}

/// Immutable description of an outbound call, replayable after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
    anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = Some(RequestBody::Multipart(body));
        self
    }

    /// Send without credentials and without the refresh protocol.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    fn header_map(&self, bearer: Option<&str>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidRequest(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidRequest(format!("Invalid value for header {}", name)))?;
            headers.insert(name, value);
        }
        if let Some(token) = bearer {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("Stored access token is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the SkillTrainer backend.
/// Clone is cheap - reqwest::Client and the session are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    refresh_path: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client from the loaded configuration
    pub fn new(config: &Config, session: Arc<Session>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            refresh_path: config.refresh_path.clone(),
            session,
        })
    }

    /// Create a client for `base_url` with default timeout and refresh path
    pub fn with_base_url(base_url: &str, session: Arc<Session>) -> Result<Self> {
        let config = Config {
            api_base_url: base_url.to_string(),
            refresh_path: REFRESH_PATH.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            ..Config::default()
        };
        Self::new(&config, session)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Response, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .headers(request.header_map(bearer)?);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        match request.body {
            Some(RequestBody::Json(ref body)) => builder = builder.json(body),
            Some(RequestBody::Multipart(ref body)) => builder = builder.multipart(body.to_form()?),
            None => {}
        }
        Ok(builder.send().await?)
    }

    /// Send a request, refreshing the access token once on a 401.
    ///
    /// Statuses other than 401 are returned untouched. A 401 with no stored
    /// refresh token is returned as `ApiError::Unauthorized`. When the refresh
    /// call fails, or the replayed request is rejected again, the session is
    /// terminated and `ApiError::SessionExpired` is returned.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        if request.anonymous {
            debug!(method = %request.method, path = %request.path, "Sending anonymous request");
            return self.execute(request, None).await;
        }

        let mut attempt: u32 = 0;
        let mut bearer = self.session.access_token();

        loop {
            debug!(
                method = %request.method,
                path = %request.path,
                attempt = attempt,
                authorized = bearer.is_some(),
                "Sending request"
            );
            let response = self.execute(request, bearer.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if attempt >= MAX_AUTH_RETRIES {
                warn!(path = %request.path, "Request rejected after token refresh, ending session");
                let cause = ApiError::from_response(response).await;
                self.session.terminate();
                return Err(ApiError::SessionExpired(Box::new(cause)));
            }
            attempt += 1;

            let Some(refresh) = self.session.refresh_token() else {
                debug!(path = %request.path, "Unauthorized with no refresh token stored");
                return Err(ApiError::from_response(response).await);
            };

            self.session.begin_refresh();
            match self.refresh_access_token(&refresh).await {
                Ok(access) => bearer = Some(access),
                Err(e) => {
                    warn!(error = %e, "Token refresh failed, ending session");
                    self.session.terminate();
                    return Err(ApiError::SessionExpired(Box::new(e)));
                }
            }
        }
    }

    /// Exchange the refresh token for a new access token and persist it.
    async fn refresh_access_token(&self, refresh: &str) -> Result<String, ApiError> {
        let request = ApiRequest::post(self.refresh_path.clone())
            .json(&json!({ "refresh": refresh }))?
            .anonymous();
        let response = Self::check_response(self.execute(&request, None).await?).await?;
        let tokens: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Malformed refresh response: {}", e)))?;

        if let Err(e) = self.session.set_access_token(&tokens.access) {
            warn!(error = %e, "Failed to persist refreshed access token");
        }
        if let Some(ref rotated) = tokens.refresh {
            if let Err(e) = self.session.set_refresh_token(rotated) {
                warn!(error = %e, "Failed to persist rotated refresh token");
            }
        }
        info!("Access token refreshed");
        Ok(tokens.access)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    pub(crate) async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self
            .send(&request)
            .await
            .with_context(|| format!("Failed to send {} request to {}", request.method, request.path))?;
        let response = Self::check_response(response)
            .await
            .with_context(|| format!("{} {} failed", request.method, request.path))?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", request.path))
    }

    /// For endpoints whose body the caller does not need (204s, messages)
    pub(crate) async fn request_empty(&self, request: ApiRequest) -> Result<()> {
        let response = self
            .send(&request)
            .await
            .with_context(|| format!("Failed to send {} request to {}", request.method, request.path))?;
        Self::check_response(response)
            .await
            .with_context(|| format!("{} {} failed", request.method, request.path))?;
        Ok(())
    }

    // ===== Authentication =====

    /// Log in with email and password, persisting the issued credential pair
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let request = ApiRequest::post("/auth/login/")
            .json(&json!({ "email": email, "password": password }))?
            .anonymous();
        let response: LoginResponse = self.request_json(request).await?;
        self.establish(response)
    }

    /// Self-register a teacher or administrator account and log it in
    pub async fn register(&self, registration: &RegisterRequest) -> Result<User> {
        if !registration.role.can_self_register() {
            return Err(ApiError::InvalidRequest(
                "Students cannot register themselves. Please contact your teacher to create an account for you."
                    .to_string(),
            )
            .into());
        }
        if registration.password != registration.password_confirm {
            return Err(ApiError::InvalidRequest("Passwords don't match".to_string()).into());
        }
        let request = ApiRequest::post("/auth/register/").json(registration)?.anonymous();
        let response: LoginResponse = self.request_json(request).await?;
        self.establish(response)
    }

    fn establish(&self, response: LoginResponse) -> Result<User> {
        self.session
            .set_credentials(&CredentialPair::new(response.access, response.refresh))
            .context("Failed to persist session tokens")?;
        info!(user_id = response.user.id, role = %response.user.role, "Logged in");
        Ok(response.user)
    }

    /// Blacklist the refresh token server-side and end the local session.
    ///
    /// The local session is terminated even when the server call fails; that
    /// failure is still returned.
    pub async fn logout(&self) -> Result<()> {
        let result = match self.session.refresh_token() {
            Some(refresh) => {
                let request = ApiRequest::post("/auth/logout/")
                    .json(&json!({ "refresh": refresh }))?
                    .anonymous();
                self.request_empty(request).await
            }
            None => Ok(()),
        };
        self.session.terminate();
        info!("Logged out");
        result
    }

    pub async fn current_user(&self) -> Result<User> {
        self.request_json(ApiRequest::get("/auth/user/")).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        self.request_empty(ApiRequest::put("/auth/profile/update/").json(update)?)
            .await
    }

    pub async fn change_password(&self, old: &str, new: &str, confirm: &str) -> Result<()> {
        if new != confirm {
            return Err(ApiError::InvalidRequest("New passwords don't match".to_string()).into());
        }
        let request = ApiRequest::post("/auth/change-password/").json(&json!({
            "old_password": old,
            "new_password": new,
            "new_password_confirm": confirm,
        }))?;
        self.request_empty(request).await
    }

    /// Unauthenticated check of backend reachability
    pub async fn check_connectivity(&self) -> Result<ServerStatus> {
        self.request_json(ApiRequest::get("/auth/test/").anonymous())
            .await
    }
}
