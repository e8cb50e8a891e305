//! Integration tests for the typed endpoints: login/register/logout and the
//! interview and resume resources.

mod common;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use skilltrainer_core::auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use skilltrainer_core::models::{
    DashboardOverview, InterviewStatus, InterviewType, NewInterview, PerformancePeriod,
    RegisterRequest, ResumeUpload, UserRole,
};
use skilltrainer_core::{ApiError, SessionState};

use common::{interview_row_json, user_json, Harness, LOGIN_PATH, REFRESH_PATH};

fn api_error(err: &anyhow::Error) -> &ApiError {
    err.downcast_ref::<ApiError>()
        .unwrap_or_else(|| panic!("expected ApiError, got {:#}", err))
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_persists_credential_pair() {
    let h = Harness::with_tokens(None, None).await;
    assert_eq!(h.session.state(), SessionState::Unauthenticated);

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .and(body_json(json!({"email": "jdoe@example.com", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "A1",
            "refresh": "R1",
            "user": user_json("teacher"),
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = h.api.login("jdoe@example.com", "hunter22").await.expect("login");
    assert_eq!(user.role, UserRole::Teacher);
    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
    assert_eq!(h.stored(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    assert_eq!(h.session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn rejected_login_does_not_trigger_refresh() {
    // A stale pair from an earlier session must not be used by login
    let h = Harness::logged_in().await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "No active account"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h.api.login("jdoe@example.com", "wrong").await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::Unauthorized(_)));

    let requests = h.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
    assert!(h.redirects().is_empty());
}

#[tokio::test]
async fn invalid_credentials_surface_as_bad_request() {
    let h = Harness::with_tokens(None, None).await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"non_field_errors": ["Invalid credentials"]})),
        )
        .mount(&h.server)
        .await;

    let err = h.api.login("jdoe@example.com", "wrong").await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::BadRequest(body) if body.contains("Invalid credentials")));
    assert_eq!(h.stored(ACCESS_TOKEN_KEY), None);
}

#[tokio::test]
async fn student_self_registration_is_rejected_locally() {
    let h = Harness::with_tokens(None, None).await;

    let registration = RegisterRequest {
        username: None,
        email: "sam@example.com".into(),
        password: "longpassword".into(),
        password_confirm: "longpassword".into(),
        first_name: "Sam".into(),
        last_name: "Lee".into(),
        role: UserRole::Student,
        phone_number: None,
    };

    let err = h.api.register(&registration).await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::InvalidRequest(_)));
    assert_eq!(h.received_count().await, 0);
}

#[tokio::test]
async fn teacher_registration_logs_in() {
    let h = Harness::with_tokens(None, None).await;

    Mock::given(method("POST"))
        .and(path("/auth/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access": "A9",
            "refresh": "R9",
            "user": user_json("teacher"),
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let registration = RegisterRequest {
        username: Some("jdoe".into()),
        email: "jdoe@example.com".into(),
        password: "longpassword".into(),
        password_confirm: "longpassword".into(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        role: UserRole::Teacher,
        phone_number: None,
    };

    h.api.register(&registration).await.expect("registration");
    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A9"));

    let requests = h.server.received_requests().await.unwrap();
    let sent: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(sent["role"], "teacher");
}

#[tokio::test]
async fn logout_blacklists_refresh_token_and_ends_session() {
    let h = Harness::logged_in().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout/"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Successfully logged out"})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.api.logout().await.expect("logout");
    assert_eq!(h.stored(ACCESS_TOKEN_KEY), None);
    assert_eq!(h.stored(REFRESH_TOKEN_KEY), None);
    assert_eq!(h.session.state(), SessionState::Unauthenticated);
    assert_eq!(h.redirects(), vec![LOGIN_PATH.to_string()]);
}

#[tokio::test]
async fn logout_clears_locally_even_when_server_fails() {
    let h = Harness::logged_in().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid token"})))
        .mount(&h.server)
        .await;

    let err = h.api.logout().await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::BadRequest(_)));
    assert_eq!(h.stored(ACCESS_TOKEN_KEY), None);
    assert_eq!(h.stored(REFRESH_TOKEN_KEY), None);
    assert_eq!(h.redirects(), vec![LOGIN_PATH.to_string()]);
}

#[tokio::test]
async fn change_password_checks_confirmation_before_sending() {
    let h = Harness::logged_in().await;

    let err = h.api.change_password("old", "newpassword", "different").await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::InvalidRequest(_)));
    assert_eq!(h.received_count().await, 0);

    Mock::given(method("POST"))
        .and(path("/auth/change-password/"))
        .and(header("authorization", "Bearer A1"))
        .and(body_json(json!({
            "old_password": "old",
            "new_password": "newpassword",
            "new_password_confirm": "newpassword",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Password changed successfully"})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.api.change_password("old", "newpassword", "newpassword").await.expect("password changed");
}

#[tokio::test]
async fn connectivity_check_is_anonymous() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/auth/test/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Backend is running successfully!",
            "status": "connected",
            "version": "1.0.0",
        })))
        .mount(&h.server)
        .await;

    let status = h.api.check_connectivity().await.expect("connectivity");
    assert_eq!(status.status, "connected");

    let requests = h.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

// ---------------------------------------------------------------------------
// Interviews
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_interviews_accepts_paginated_body() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/interviews/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "previous": null,
            "results": [interview_row_json(1), interview_row_json(2)],
        })))
        .mount(&h.server)
        .await;

    let rows = h.api.list_interviews().await.expect("list");
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(rows[0].status, InterviewStatus::Scheduled);
}

#[tokio::test]
async fn create_interview_rejects_inverted_window_without_request() {
    let h = Harness::logged_in().await;
    let start = Utc::now() + Duration::days(1);

    let interview = NewInterview {
        student: 3,
        scheduled_datetime: start,
        end_datetime: start - Duration::minutes(5),
        interview_type: InterviewType::Communication,
        duration_minutes: 30,
        instructions: String::new(),
        is_secure_mode: true,
    };

    let err = h.api.create_interview(&interview).await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::InvalidRequest(_)));
    assert_eq!(h.received_count().await, 0);
}

#[tokio::test]
async fn create_interview_posts_payload() {
    let h = Harness::logged_in().await;
    let start = Utc::now() + Duration::days(1);

    Mock::given(method("POST"))
        .and(path("/interviews/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 31,
            "student": 3,
            "teacher": 7,
            "student_name": "Sam Lee",
            "teacher_name": "Jane Doe",
            "scheduled_datetime": "2025-03-01T09:30:00Z",
            "end_datetime": "2025-03-01T10:30:00Z",
            "interview_type": "technical",
            "status": "scheduled",
            "duration_minutes": 60,
            "instructions": "",
            "questions": [],
            "feedback": null,
            "time_remaining": 0,
            "overall_score": null
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let interview = NewInterview {
        student: 3,
        scheduled_datetime: start,
        end_datetime: start + Duration::minutes(60),
        interview_type: InterviewType::Technical,
        duration_minutes: 60,
        instructions: String::new(),
        is_secure_mode: true,
    };

    let created = h.api.create_interview(&interview).await.expect("created");
    assert_eq!(created.id, 31);

    let requests = h.server.received_requests().await.unwrap();
    let sent: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(sent["student"], 3);
    assert_eq!(sent["interview_type"], "technical");
}

#[tokio::test]
async fn delete_interview_accepts_no_content() {
    let h = Harness::logged_in().await;

    Mock::given(method("DELETE"))
        .and(path("/interviews/5/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    h.api.delete_interview(5).await.expect("deleted");
}

#[tokio::test]
async fn deleting_someone_elses_interview_is_access_denied() {
    let h = Harness::logged_in().await;

    Mock::given(method("DELETE"))
        .and(path("/interviews/6/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "You do not have permission"})))
        .mount(&h.server)
        .await;

    let err = h.api.delete_interview(6).await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::AccessDenied(_)));
    assert!(h.redirects().is_empty());
}

// ---------------------------------------------------------------------------
// Resumes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_resume_analysis_is_not_found() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/resumes/9/get_analysis/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "Resume has not been analyzed yet"})),
        )
        .mount(&h.server)
        .await;

    let err = h.api.resume_analysis(9).await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::NotFound(body) if body.contains("not been analyzed")));
}

#[tokio::test]
async fn analyze_resume_returns_fresh_analysis() {
    let h = Harness::logged_in().await;

    Mock::given(method("POST"))
        .and(path("/resumes/9/analyze_resume/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Resume analyzed successfully",
            "analysis": {
                "id": 2,
                "overall_score": 81,
                "strengths": ["Strong projects"],
                "weaknesses": [],
                "suggestions": [],
                "recommended_roles": ["Data Analyst"],
                "skill_gaps": [],
                "market_relevance": "medium"
            }
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let analysis = h.api.analyze_resume(9).await.expect("analysis").expect("analysis body");
    assert_eq!(analysis.overall_score, 81);
    assert_eq!(analysis.recommended_roles, vec!["Data Analyst".to_string()]);
}

#[tokio::test]
async fn unsupported_resume_file_is_rejected_without_request() {
    let h = Harness::logged_in().await;

    let upload = ResumeUpload::new(3, "portrait.png", b"not a resume".to_vec());
    let err = h.api.upload_resume(&upload).await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::InvalidRequest(msg) if msg.contains("Unsupported file format")));
    assert_eq!(h.received_count().await, 0);
}

#[tokio::test]
async fn student_upload_is_access_denied() {
    let h = Harness::logged_in().await;

    Mock::given(method("POST"))
        .and(path("/resumes/upload_resume/"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"error": "Only teachers and administrators can upload resumes"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let upload = ResumeUpload::new(3, "cv.pdf", b"%PDF-1.4 resume".to_vec());
    let err = h.api.upload_resume(&upload).await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::AccessDenied(body) if body.contains("Only teachers")));
    assert_eq!(h.session.state(), SessionState::Authenticated);
}

// ---------------------------------------------------------------------------
// Interview results
// ---------------------------------------------------------------------------

#[tokio::test]
async fn interview_results_include_feedback_and_analytics() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/interviews/4/get_results/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": {
                "id": 4, "student": 3, "teacher": 7, "student_name": "Sam Lee",
                "scheduled_datetime": "2025-03-01T09:30:00Z", "end_datetime": "2025-03-01T10:30:00Z",
                "interview_type": "technical", "status": "completed", "duration_minutes": 60
            },
            "responses": [{
                "id": 1, "question": 10, "question_text": "Explain ownership in Rust", "question_order": 1,
                "answer_text": "Each value has a single owner", "score": 8, "ai_feedback": "Accurate",
                "answered_at": "2025-03-01T09:40:00Z", "time_taken_seconds": 95,
                "relevance_score": 9, "completeness_score": 7, "clarity_score": 8, "example_score": 6
            }],
            "feedback": {"id": 2, "overall_score": 78, "strengths": ["Clear answers"], "areas_for_improvement": []},
            "analytics": {"total_questions": 5, "questions_answered": 5,
                          "completion_percentage": 100.0, "average_response_time": 88.4}
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let results = h.api.interview_results(4).await.expect("results");
    assert_eq!(results.session.status, InterviewStatus::Completed);
    assert_eq!(results.responses[0].time_taken_seconds, Some(95));
    assert_eq!(results.feedback.expect("feedback").overall_score, 78);
    assert_eq!(results.analytics.expect("analytics").questions_answered, 5);
}

#[tokio::test]
async fn results_of_unfinished_interview_are_bad_request() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/interviews/5/get_results/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Interview not completed yet"})))
        .mount(&h.server)
        .await;

    let err = h.api.interview_results(5).await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::BadRequest(body) if body.contains("not completed")));
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn teacher_overview_is_parsed_by_shape() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/overview/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_students": 12,
            "active_students": 10,
            "interviews_conducted": 33,
            "interviews_this_month": 4,
            "average_student_score": 68.5,
            "recent_interviews": [{"id": 4, "student_name": "Sam Lee"}],
            "student_progress": [],
            "pending_reviews": []
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    match h.api.dashboard_overview().await.expect("overview") {
        DashboardOverview::Teacher(overview) => {
            assert_eq!(overview.total_students, 12);
            assert_eq!(overview.recent_interviews.len(), 1);
        }
        other => panic!("expected teacher overview, got {:?}", other),
    }
}

#[tokio::test]
async fn analytics_is_administrator_only() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/analytics/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Access denied"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.api.analytics().await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::AccessDenied(_)));
    // 403 is not an authentication failure
    assert_eq!(h.stored(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
    assert!(h.redirects().is_empty());
}

#[tokio::test]
async fn analytics_parses_distribution_and_growth() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/analytics/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_growth": [{"month": "2025-01-01T00:00:00Z", "count": 14}],
            "interview_trends": [{"week": "2025-02-24T00:00:00Z", "interview_type": "aptitude", "count": 3}],
            "performance_distribution": {"0-20": 0, "21-40": 1, "41-60": 4, "61-80": 9, "81-100": 2},
            "skill_analysis": {"technical": 71.2, "communication": 66.0, "aptitude": 0}
        })))
        .mount(&h.server)
        .await;

    let analytics = h.api.analytics().await.expect("analytics");
    assert_eq!(analytics.user_growth[0].count, 14);
    assert_eq!(analytics.interview_trends[0].interview_type, InterviewType::Aptitude);
    assert_eq!(analytics.performance_distribution.get("61-80"), Some(&9));
    assert_eq!(analytics.skill_analysis.get("aptitude"), Some(&0.0));
}

#[tokio::test]
async fn performance_sends_period_and_category() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/performance/"))
        .and(query_param("period", "7d"))
        .and(query_param("category", "technical"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_interviews": 2,
            "average_score": 81.0,
            "daily_trends": [{"date": "2025-03-01", "count": 2, "avg_score": 81.0}],
            "period": "7d",
            "category": "technical"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let perf = h
        .api
        .performance(PerformancePeriod::Week, Some(InterviewType::Technical))
        .await
        .expect("performance");
    assert_eq!(perf.total_interviews, 2);
    assert_eq!(perf.category, Some(InterviewType::Technical));
}

#[tokio::test]
async fn student_analytics_for_unknown_student_is_not_found() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/99/student_analytics/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Student not found"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.api.student_analytics(99).await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::NotFound(body) if body.contains("Student not found")));
}

#[tokio::test]
async fn dashboard_metrics_parses_daily_rows() {
    let h = Harness::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/metrics/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "date": "2025-03-02",
            "total_users": 40, "total_students": 30, "total_teachers": 9,
            "active_users_today": 11, "new_users_today": 1,
            "total_interviews": 120, "interviews_today": 3, "completed_interviews": 100,
            "average_score": 71.5,
            "total_resumes": 28, "resumes_uploaded_today": 0, "average_resume_score": 66.0,
            "created_at": "2025-03-02T23:55:00Z"
        }])))
        .expect(1)
        .mount(&h.server)
        .await;

    let rows = h.api.dashboard_metrics().await.expect("metrics");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date.to_string(), "2025-03-02");
    assert_eq!(rows[0].interviews_today, 3);
}
