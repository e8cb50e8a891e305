//! Core library for the SkillTrainer interview-preparation platform client.
//!
//! - `api`: authenticated REST client with one-shot token refresh
//! - `auth`: session object, token stores, login redirect
//! - `config`: configuration file and environment overrides
//! - `models`: request and response types

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest, MultipartBody, RequestBody};
pub use auth::{CredentialPair, Session, SessionState};
pub use config::Config;
