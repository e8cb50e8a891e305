//! Interview, resume and dashboard endpoints.

use anyhow::Result;
use tracing::{debug, info};

use crate::models::{
    Analytics, AnalyzeResumeResponse, DailyMetrics, DashboardOverview, Interview, InterviewResults,
    InterviewSummary, InterviewType, InterviewUpdate, Listing, NewInterview, Performance,
    PerformancePeriod, Resume, ResumeAnalysis, ResumeSummary, ResumeUpload, StudentAnalytics,
    UploadResumeResponse,
};

use super::client::{ApiClient, ApiRequest, MultipartBody};
use super::ApiError;

impl ApiClient {
    // ===== Interviews =====

    pub async fn list_interviews(&self) -> Result<Vec<InterviewSummary>> {
        let listing: Listing<InterviewSummary> =
            self.request_json(ApiRequest::get("/interviews/")).await?;
        let items = listing.into_items();
        debug!(count = items.len(), "Fetched interviews");
        Ok(items)
    }

    pub async fn get_interview(&self, id: i64) -> Result<Interview> {
        self.request_json(ApiRequest::get(format!("/interviews/{}/", id)))
            .await
    }

    pub async fn create_interview(&self, interview: &NewInterview) -> Result<Interview> {
        interview.validate().map_err(ApiError::InvalidRequest)?;
        self.request_json(ApiRequest::post("/interviews/").json(interview)?)
            .await
    }

    pub async fn update_interview(&self, id: i64, update: &InterviewUpdate) -> Result<Interview> {
        if let (Some(start), Some(end)) = (update.scheduled_datetime, update.end_datetime) {
            if end <= start {
                return Err(ApiError::InvalidRequest("End time must be after start time".into()).into());
            }
        }
        self.request_json(ApiRequest::patch(format!("/interviews/{}/", id)).json(update)?)
            .await
    }

    pub async fn delete_interview(&self, id: i64) -> Result<()> {
        self.request_empty(ApiRequest::delete(format!("/interviews/{}/", id)))
            .await
    }

    /// Answers, feedback and analytics of a completed interview
    pub async fn interview_results(&self, id: i64) -> Result<InterviewResults> {
        self.request_json(ApiRequest::get(format!("/interviews/{}/get_results/", id)))
            .await
    }

    // ===== Resumes =====

    pub async fn list_resumes(&self) -> Result<Vec<ResumeSummary>> {
        let listing: Listing<ResumeSummary> = self.request_json(ApiRequest::get("/resumes/")).await?;
        let items = listing.into_items();
        debug!(count = items.len(), "Fetched resumes");
        Ok(items)
    }

    pub async fn get_resume(&self, id: i64) -> Result<Resume> {
        self.request_json(ApiRequest::get(format!("/resumes/{}/", id)))
            .await
    }

    pub async fn delete_resume(&self, id: i64) -> Result<()> {
        self.request_empty(ApiRequest::delete(format!("/resumes/{}/", id)))
            .await
    }

    /// Upload a resume file for a student (teachers and administrators).
    ///
    /// The backend replaces the student's existing resume, keeping a version
    /// backup, and analyzes the new one before responding.
    pub async fn upload_resume(&self, upload: &ResumeUpload) -> Result<Resume> {
        upload.validate().map_err(ApiError::InvalidRequest)?;

        let mut form = MultipartBody::new().text("student_id", upload.student_id.to_string());
        if let Some(ref title) = upload.title {
            form = form.text("title", title.clone());
        }
        if let Some(ref description) = upload.description {
            form = form.text("description", description.clone());
        }
        let form = form.file(
            "resume_file",
            upload.file_name.clone(),
            Some(upload.content_type()),
            upload.content.clone(),
        );

        let response: UploadResumeResponse = self
            .request_json(ApiRequest::post("/resumes/upload_resume/").multipart(form))
            .await?;
        info!(
            resume_id = response.resume.id,
            student_id = upload.student_id,
            size = upload.content.len(),
            "Resume uploaded"
        );
        Ok(response.resume)
    }

    /// Ask the backend to re-run the AI analysis of a resume
    pub async fn analyze_resume(&self, id: i64) -> Result<Option<ResumeAnalysis>> {
        let response: AnalyzeResumeResponse = self
            .request_json(ApiRequest::post(format!("/resumes/{}/analyze_resume/", id)))
            .await?;
        debug!(resume_id = id, message = %response.message, "Resume analysis requested");
        Ok(response.analysis)
    }

    /// Stored analysis; `NotFound` when the resume has not been analyzed yet
    pub async fn resume_analysis(&self, id: i64) -> Result<ResumeAnalysis> {
        self.request_json(ApiRequest::get(format!("/resumes/{}/get_analysis/", id)))
            .await
    }

    // ===== Dashboard =====

    /// Role-specific summary for the signed-in user
    pub async fn dashboard_overview(&self) -> Result<DashboardOverview> {
        self.request_json(ApiRequest::get("/dashboard/overview/"))
            .await
    }

    /// Daily platform metrics, most recent 30 days (administrators)
    pub async fn dashboard_metrics(&self) -> Result<Vec<DailyMetrics>> {
        self.request_json(ApiRequest::get("/dashboard/metrics/"))
            .await
    }

    /// Platform-wide growth, trends and score distribution (administrators)
    pub async fn analytics(&self) -> Result<Analytics> {
        self.request_json(ApiRequest::get("/dashboard/analytics/"))
            .await
    }

    /// Completed-interview performance over `period`, optionally for one interview type
    pub async fn performance(
        &self,
        period: PerformancePeriod,
        category: Option<InterviewType>,
    ) -> Result<Performance> {
        let mut request = ApiRequest::get("/dashboard/performance/").query("period", period.as_str());
        if let Some(category) = category {
            request = request.query("category", category.as_str());
        }
        self.request_json(request).await
    }

    /// Score history of one student (teachers for their own students, administrators)
    pub async fn student_analytics(&self, student_id: i64) -> Result<StudentAnalytics> {
        self.request_json(ApiRequest::get(format!("/dashboard/{}/student_analytics/", student_id)))
            .await
    }
}
