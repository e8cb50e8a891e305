use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Technical,
    Communication,
    Aptitude,
}

impl InterviewType {
    /// Wire name, as used in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Technical => "technical",
            InterviewType::Communication => "communication",
            InterviewType::Aptitude => "aptitude",
        }
    }
}

impl FromStr for InterviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "technical" => Ok(InterviewType::Technical),
            "communication" => Ok(InterviewType::Communication),
            "aptitude" => Ok(InterviewType::Aptitude),
            other => Err(format!("Unknown interview type: {}", other)),
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterviewType::Technical => write!(f, "Technical"),
            InterviewType::Communication => write!(f, "Communication"),
            InterviewType::Aptitude => write!(f, "Aptitude"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Missed,
    Cancelled,
    Terminated,
}

impl InterviewStatus {
    /// Sessions that can still be started or are running
    pub fn is_open(&self) -> bool {
        matches!(self, InterviewStatus::Scheduled | InterviewStatus::InProgress)
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterviewStatus::Scheduled => write!(f, "Scheduled"),
            InterviewStatus::InProgress => write!(f, "In Progress"),
            InterviewStatus::Completed => write!(f, "Completed"),
            InterviewStatus::Missed => write!(f, "Missed"),
            InterviewStatus::Cancelled => write!(f, "Cancelled"),
            InterviewStatus::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Row of `GET /interviews/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct InterviewSummary {
    pub id: i64,
    pub student_name: Option<String>,
    pub teacher_name: Option<String>,
    pub scheduled_datetime: DateTime<Utc>,
    pub interview_type: InterviewType,
    pub status: InterviewStatus,
    pub duration_minutes: i64,
    pub overall_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct InterviewQuestion {
    pub id: i64,
    pub question_text: String,
    pub question_order: i64,
    pub generated_at: Option<DateTime<Utc>>,
    pub expected_duration_minutes: Option<i64>,
    pub difficulty_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct InterviewFeedback {
    pub id: i64,
    pub overall_score: i64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub detailed_feedback: String,
    #[serde(default)]
    pub recommendations: String,
    pub technical_score: Option<i64>,
    pub communication_score: Option<i64>,
    pub problem_solving_score: Option<i64>,
}

/// Full record of `GET /interviews/{id}/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Interview {
    pub id: i64,
    pub student: i64,
    pub teacher: Option<i64>,
    pub student_name: Option<String>,
    pub teacher_name: Option<String>,
    pub scheduled_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub interview_type: InterviewType,
    pub status: InterviewStatus,
    pub duration_minutes: i64,
    #[serde(default)]
    pub instructions: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tab_switches: i64,
    #[serde(default)]
    pub warning_count: i64,
    #[serde(default)]
    pub is_secure_mode: bool,
    #[serde(default)]
    pub questions: Vec<InterviewQuestion>,
    pub feedback: Option<InterviewFeedback>,
    /// Minutes left while in progress
    pub time_remaining: Option<i64>,
    pub overall_score: Option<f64>,
}

/// Payload of `POST /interviews/`
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct NewInterview {
    pub student: i64,
    pub scheduled_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub interview_type: InterviewType,
    pub duration_minutes: i64,
    pub instructions: String,
    pub is_secure_mode: bool,
}

impl NewInterview {
    /// Check the constraints the backend would otherwise reject.
    pub fn validate(&self) -> Result<(), String> {
        if self.end_datetime <= self.scheduled_datetime {
            return Err("End time must be after start time".to_string());
        }
        if self.duration_minutes <= 0 {
            return Err("Duration must be positive".to_string());
        }
        Ok(())
    }
}

/// Partial update sent with `PATCH /interviews/{id}/`
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct InterviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InterviewStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Candidate answer with its AI grading
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct InterviewResponse {
    pub id: i64,
    pub question: i64,
    pub question_text: Option<String>,
    pub question_order: Option<i64>,
    #[serde(default)]
    pub answer_text: String,
    pub score: Option<i64>,
    #[serde(default)]
    pub ai_feedback: String,
    pub answered_at: Option<DateTime<Utc>>,
    pub time_taken_seconds: Option<i64>,
    pub relevance_score: Option<i64>,
    pub completeness_score: Option<i64>,
    pub clarity_score: Option<i64>,
    pub example_score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct InterviewAnalytics {
    pub total_questions: i64,
    pub questions_answered: i64,
    pub completion_percentage: f64,
    /// Seconds
    pub average_response_time: f64,
}

/// Body of `GET /interviews/{id}/get_results/`, only served for completed sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct InterviewResults {
    pub session: Interview,
    #[serde(default)]
    pub responses: Vec<InterviewResponse>,
    pub feedback: Option<InterviewFeedback>,
    pub analytics: Option<InterviewAnalytics>,
}

impl InterviewResults {
    pub fn answered(&self) -> usize {
        self.responses.iter().filter(|r| !r.answer_text.trim().is_empty()).count()
    }
}
