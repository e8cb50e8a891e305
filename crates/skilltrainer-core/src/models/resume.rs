use std::fmt;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Row of `GET /resumes/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ResumeSummary {
    pub id: i64,
    pub student: i64,
    pub student_name: Option<String>,
    pub file_name: String,
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    pub word_count: Option<i64>,
    pub overall_score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ResumeAnalysis {
    pub id: i64,
    pub overall_score: i64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub content_quality_score: i64,
    #[serde(default)]
    pub formatting_score: i64,
    #[serde(default)]
    pub keywords_score: i64,
    #[serde(default)]
    pub experience_relevance_score: i64,
    #[serde(default)]
    pub recommended_roles: Vec<String>,
    #[serde(default)]
    pub skill_gaps: Vec<String>,
    pub market_relevance: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Full record of `GET /resumes/{id}/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Resume {
    pub id: i64,
    pub student: i64,
    pub student_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub uploaded_by_name: Option<String>,
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    pub experience_years: Option<f64>,
    pub last_analyzed: Option<DateTime<Utc>>,
    pub word_count: Option<i64>,
    #[serde(default)]
    pub skills_list: Vec<String>,
    pub analysis: Option<ResumeAnalysis>,
}

/// Body of `POST /resumes/{id}/analyze_resume/`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResumeResponse {
    pub message: String,
    pub analysis: Option<ResumeAnalysis>,
}

/// Body of `POST /resumes/upload_resume/`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResumeResponse {
    pub message: String,
    pub resume: Resume,
}

/// File types the backend can extract text from
pub const RESUME_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

/// Largest accepted upload (10 MB)
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

/// A resume file to upload for a student.
#[derive(Clone)]
pub struct ResumeUpload {
    pub student_id: i64,
    pub file_name: String,
    pub content: Vec<u8>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl fmt::Debug for ResumeUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeUpload")
            .field("student_id", &self.student_id)
            .field("file_name", &self.file_name)
            .field("size", &self.content.len())
            .field("title", &self.title)
            .finish()
    }
}

impl ResumeUpload {
    pub fn new(student_id: i64, file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            student_id,
            file_name: file_name.into(),
            content,
            title: None,
            description: None,
        }
    }

    /// Read the file at `path`; the upload keeps only its file name.
    pub fn from_path(student_id: i64, path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read(path)
            .with_context(|| format!("Failed to read resume file {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid resume file name: {}", path.display()))?;
        Ok(Self::new(student_id, file_name, content))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn content_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            Some("doc") => "application/msword",
            Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }

    /// Check the constraints the backend would otherwise reject.
    pub fn validate(&self) -> Result<(), String> {
        match self.extension() {
            Some(ext) if RESUME_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => {
                return Err(format!(
                    "Unsupported file format. Allowed formats: {}",
                    RESUME_EXTENSIONS
                        .iter()
                        .map(|e| format!(".{}", e))
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            }
        }
        if self.content.is_empty() {
            return Err("Resume file is empty".to_string());
        }
        if self.content.len() > MAX_RESUME_BYTES {
            return Err("File size must be less than 10MB".to_string());
        }
        if self.title.as_ref().is_some_and(|t| t.chars().count() > 200) {
            return Err("Title must be at most 200 characters".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_validation() {
        let upload = ResumeUpload::new(3, "Sam_Lee.PDF", b"resume text".to_vec());
        assert!(upload.validate().is_ok());
        assert_eq!(upload.content_type(), "application/pdf");

        let err = ResumeUpload::new(3, "photo.png", b"png".to_vec()).validate().unwrap_err();
        assert!(err.contains(".pdf, .doc, .docx, .txt"));

        assert!(ResumeUpload::new(3, "empty.txt", Vec::new()).validate().is_err());
        assert!(ResumeUpload::new(3, "big.pdf", vec![0; MAX_RESUME_BYTES + 1])
            .validate()
            .is_err());
    }

    #[test]
    fn test_upload_from_path_keeps_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.docx");
        std::fs::write(&path, b"docx bytes").unwrap();

        let upload = ResumeUpload::from_path(5, &path).unwrap().with_title("Backend CV");
        assert_eq!(upload.file_name, "cv.docx");
        assert_eq!(upload.content, b"docx bytes".to_vec());
        assert_eq!(upload.title.as_deref(), Some("Backend CV"));

        assert!(ResumeUpload::from_path(5, &dir.path().join("missing.pdf")).is_err());
    }

    #[test]
    fn test_parse_analyze_response() {
        let json = r#"{"message": "Resume analyzed successfully", "analysis": {
            "id": 4, "overall_score": 72, "strengths": ["Clear layout"],
            "weaknesses": [], "suggestions": ["Quantify results"],
            "content_quality_score": 70, "formatting_score": 80, "keywords_score": 65,
            "experience_relevance_score": 60, "recommended_roles": ["Backend Developer"],
            "skill_gaps": ["Kubernetes"], "market_relevance": "high",
            "created_at": "2025-02-10T08:00:00Z", "updated_at": "2025-02-10T08:00:00Z"}}"#;
        let resp: AnalyzeResumeResponse = serde_json::from_str(json).expect("Failed to parse analysis");
        let analysis = resp.analysis.expect("analysis present");
        assert_eq!(analysis.overall_score, 72);
        assert_eq!(analysis.skill_gaps, vec!["Kubernetes".to_string()]);
    }

    #[test]
    fn test_parse_resume_without_analysis() {
        let json = r#"{"id": 9, "student": 3, "file_name": "cv.pdf", "analysis": null}"#;
        let resume: Resume = serde_json::from_str(json).unwrap();
        assert!(resume.analysis.is_none());
        assert!(resume.skills_list.is_empty());
    }
}
