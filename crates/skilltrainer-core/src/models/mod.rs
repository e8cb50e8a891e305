//! Data models for SkillTrainer entities.
//!
//! This module contains the data structures exchanged with the backend:
//!
//! - `User`, `UserRole` and the auth request/response bodies
//! - `Interview`, `InterviewSummary`, `NewInterview`: interview sessions
//! - `Resume`, `ResumeSummary`, `ResumeAnalysis`, `ResumeUpload`: resumes
//! - `DashboardOverview`, `Analytics`, `Performance`: dashboard views
//! - `Listing`: list responses, bare or paginated

pub mod dashboard;
pub mod interview;
pub mod resume;
pub mod user;

use serde::Deserialize;

pub use dashboard::{
    AdminOverview, Analytics, DailyMetrics, DailyTrend, DashboardOverview, GrowthPoint,
    InterviewTrendPoint, Performance, PerformancePeriod, PerformanceSummary, ScoreTrend,
    ScoredInterview, SkillAverages, StudentAnalytics, StudentOverview, TeacherOverview,
};
pub use interview::{
    Interview, InterviewAnalytics, InterviewFeedback, InterviewQuestion, InterviewResponse,
    InterviewResults, InterviewStatus, InterviewSummary, InterviewType, InterviewUpdate,
    NewInterview,
};
pub use resume::{
    AnalyzeResumeResponse, Resume, ResumeAnalysis, ResumeSummary, ResumeUpload, UploadResumeResponse,
    MAX_RESUME_BYTES, RESUME_EXTENSIONS,
};
pub use user::{
    LoginResponse, ProfileUpdate, RefreshResponse, RegisterRequest, ServerStatus, User, UserRole,
};

/// List endpoint body: a bare array, or a paginated `{count, next, previous, results}` page
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page {
        count: Option<i64>,
        next: Option<String>,
        previous: Option<String>,
        results: Vec<T>,
    },
    Items(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Page { results, .. } => results,
            Listing::Items(items) => items,
        }
    }
}
