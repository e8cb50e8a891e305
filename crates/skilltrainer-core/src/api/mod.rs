//! REST API client module for the SkillTrainer backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! interview-preparation API: authentication, interviews, resumes and
//! dashboards.
//!
//! The API uses JWT bearer tokens. Access tokens are short-lived; the client
//! exchanges the stored refresh token for a new one when a request is
//! rejected with 401, then replays that request once.

pub mod client;
pub mod error;
mod resources;

pub use client::{ApiClient, ApiRequest, MultipartBody, RequestBody};
pub use error::ApiError;
