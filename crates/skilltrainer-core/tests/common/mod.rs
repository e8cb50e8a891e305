//! Shared test helpers: a mock backend plus a client wired to an in-memory session.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::MockServer;

use skilltrainer_core::auth::{
    LoginRedirect, MemoryTokenStore, Session, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use skilltrainer_core::ApiClient;

pub const LOGIN_PATH: &str = "/login";
pub const REFRESH_PATH: &str = "/auth/token/refresh/";

pub struct Harness {
    pub server: MockServer,
    pub store: Arc<MemoryTokenStore>,
    pub session: Arc<Session>,
    pub redirects: Arc<Mutex<Vec<String>>>,
    pub api: ApiClient,
}

impl Harness {
    /// Mock backend with `access`/`refresh` already stored.
    pub async fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        let store = Arc::new(MemoryTokenStore::new());
        if let Some(access) = access {
            store.set(ACCESS_TOKEN_KEY, access).unwrap();
        }
        if let Some(refresh) = refresh {
            store.set(REFRESH_TOKEN_KEY, refresh).unwrap();
        }

        let redirects = Arc::new(Mutex::new(Vec::new()));
        let session = Arc::new(Session::new(
            store.clone() as Arc<dyn TokenStore>,
            recording_redirect(&redirects),
            LOGIN_PATH,
        ));

        let server = MockServer::start().await;
        let api = ApiClient::with_base_url(&server.uri(), session.clone()).expect("client builds");

        Self {
            server,
            store,
            session,
            redirects,
            api,
        }
    }

    pub async fn logged_in() -> Self {
        Self::with_tokens(Some("A1"), Some("R1")).await
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }

    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0)
    }
}

pub fn recording_redirect(seen: &Arc<Mutex<Vec<String>>>) -> Arc<dyn LoginRedirect> {
    let sink = seen.clone();
    Arc::new(move |path: &str| sink.lock().unwrap().push(path.to_string()))
}

pub fn user_json(role: &str) -> Value {
    json!({
        "id": 7,
        "username": "jdoe",
        "email": "jdoe@example.com",
        "first_name": "Jane",
        "last_name": "Doe",
        "role": role,
        "full_name": "Jane Doe",
        "phone_number": null,
        "profile_picture": null,
        "is_active": true,
        "date_joined": "2024-09-01T10:00:00Z"
    })
}

pub fn interview_row_json(id: i64) -> Value {
    json!({
        "id": id,
        "student_name": "Sam Lee",
        "teacher_name": "Jane Doe",
        "scheduled_datetime": "2025-03-01T09:30:00Z",
        "interview_type": "technical",
        "status": "scheduled",
        "duration_minutes": 60,
        "overall_score": null
    })
}
