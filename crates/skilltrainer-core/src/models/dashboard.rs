use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "ts")]
use ts_rs::TS;

use super::InterviewType;

/// Body of `GET /dashboard/overview/`; the shape depends on the caller's role.
///
/// Variants are tried in order and told apart by their required fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(untagged)]
pub enum DashboardOverview {
    Administrator(AdminOverview),
    Teacher(TeacherOverview),
    Student(StudentOverview),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct AdminOverview {
    pub total_users: i64,
    pub total_students: i64,
    pub total_teachers: i64,
    pub new_users_this_week: i64,
    pub total_interviews: i64,
    pub interviews_this_week: i64,
    pub completed_interviews: i64,
    pub average_score: f64,
    #[serde(default)]
    pub recent_interviews: Vec<Value>,
    #[serde(default)]
    pub top_performing_students: Vec<Value>,
    #[serde(default)]
    pub alerts: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct TeacherOverview {
    pub total_students: i64,
    pub active_students: i64,
    pub interviews_conducted: i64,
    pub interviews_this_month: i64,
    pub average_student_score: f64,
    #[serde(default)]
    pub recent_interviews: Vec<Value>,
    #[serde(default)]
    pub student_progress: Vec<Value>,
    #[serde(default)]
    pub pending_reviews: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct StudentOverview {
    pub total_interviews: i64,
    pub completed_interviews: i64,
    pub average_score: f64,
    pub score_trend: String,
    pub technical_average: f64,
    pub communication_average: f64,
    pub aptitude_average: f64,
    pub improvement_percentage: f64,
    pub streak_days: i64,
    pub next_interview: Option<Value>,
    #[serde(default)]
    pub recent_interviews: Vec<Value>,
    #[serde(default)]
    pub achievements: Vec<Value>,
}

/// One day of `GET /dashboard/metrics/` (administrators only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub total_users: i64,
    pub total_students: i64,
    pub total_teachers: i64,
    pub active_users_today: i64,
    pub new_users_today: i64,
    pub total_interviews: i64,
    pub interviews_today: i64,
    pub completed_interviews: i64,
    pub average_score: f64,
    pub total_resumes: i64,
    pub resumes_uploaded_today: i64,
    pub average_resume_score: f64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `GET /dashboard/analytics/` (administrators only)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Analytics {
    #[serde(default)]
    pub user_growth: Vec<GrowthPoint>,
    #[serde(default)]
    pub interview_trends: Vec<InterviewTrendPoint>,
    /// Completed interviews per score band ("0-20" .. "81-100")
    #[serde(default)]
    pub performance_distribution: BTreeMap<String, i64>,
    /// Average score per interview type
    #[serde(default)]
    pub skill_analysis: BTreeMap<String, f64>,
}

/// New accounts per month; `month` is the bucket start as sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct GrowthPoint {
    pub month: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct InterviewTrendPoint {
    pub week: Option<String>,
    pub interview_type: InterviewType,
    pub count: i64,
}

/// Window accepted by `GET /dashboard/performance/`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PerformancePeriod {
    Week,
    #[default]
    Month,
    Quarter,
}

impl PerformancePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformancePeriod::Week => "7d",
            PerformancePeriod::Month => "30d",
            PerformancePeriod::Quarter => "90d",
        }
    }
}

impl fmt::Display for PerformancePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformancePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(PerformancePeriod::Week),
            "30d" => Ok(PerformancePeriod::Month),
            "90d" => Ok(PerformancePeriod::Quarter),
            other => Err(format!("Unknown period '{}' (expected 7d, 30d or 90d)", other)),
        }
    }
}

/// Body of `GET /dashboard/performance/` (teachers and administrators)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Performance {
    pub total_interviews: i64,
    pub average_score: f64,
    #[serde(default)]
    pub daily_trends: Vec<DailyTrend>,
    pub period: String,
    pub category: Option<InterviewType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub count: i64,
    pub avg_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ScoreTrend {
    Improving,
    Stable,
    Declining,
}

impl fmt::Display for ScoreTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreTrend::Improving => write!(f, "Improving"),
            ScoreTrend::Stable => write!(f, "Stable"),
            ScoreTrend::Declining => write!(f, "Declining"),
        }
    }
}

/// Body of `GET /dashboard/{student_id}/student_analytics/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct StudentAnalytics {
    pub total_interviews: i64,
    pub average_score: f64,
    pub trend: ScoreTrend,
    pub skills: SkillAverages,
    #[serde(default)]
    pub recent_interviews: Vec<ScoredInterview>,
    pub performance_summary: PerformanceSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct SkillAverages {
    pub technical: f64,
    pub communication: f64,
    pub problem_solving: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ScoredInterview {
    pub date: NaiveDate,
    pub interview_type: InterviewType,
    pub score: f64,
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct PerformanceSummary {
    pub recent_average: f64,
    pub overall_average: f64,
    pub improvement: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_picks_variant_by_role_shape() {
        let admin = r#"{"total_users": 40, "total_students": 30, "total_teachers": 9,
            "new_users_this_week": 2, "total_interviews": 120, "interviews_this_week": 6,
            "completed_interviews": 100, "average_score": 71.5,
            "recent_interviews": [], "top_performing_students": [], "alerts": []}"#;
        assert!(matches!(
            serde_json::from_str::<DashboardOverview>(admin).unwrap(),
            DashboardOverview::Administrator(o) if o.total_users == 40
        ));

        let teacher = r#"{"total_students": 12, "active_students": 10, "interviews_conducted": 33,
            "interviews_this_month": 4, "average_student_score": 68.0,
            "recent_interviews": [], "student_progress": [], "pending_reviews": []}"#;
        assert!(matches!(
            serde_json::from_str::<DashboardOverview>(teacher).unwrap(),
            DashboardOverview::Teacher(o) if o.interviews_conducted == 33
        ));

        let student = r#"{"total_interviews": 5, "completed_interviews": 4, "average_score": 77.2,
            "score_trend": "improving", "technical_average": 80.0, "communication_average": 75.0,
            "aptitude_average": 70.0, "improvement_percentage": 12.5, "streak_days": 3,
            "next_interview": null, "recent_interviews": [], "achievements": []}"#;
        assert!(matches!(
            serde_json::from_str::<DashboardOverview>(student).unwrap(),
            DashboardOverview::Student(o) if o.streak_days == 3 && o.next_interview.is_none()
        ));
    }

    #[test]
    fn test_parse_performance() {
        let json = r#"{"total_interviews": 3, "average_score": 74.3, "period": "7d", "category": null,
            "daily_trends": [{"date": "2025-03-01", "count": 2, "avg_score": 70.5},
                             {"date": "2025-03-02", "count": 1, "avg_score": null}]}"#;
        let perf: Performance = serde_json::from_str(json).unwrap();
        assert_eq!(perf.daily_trends.len(), 2);
        assert_eq!(perf.daily_trends[0].date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert!(perf.daily_trends[1].avg_score.is_none());
        assert!(perf.category.is_none());
    }

    #[test]
    fn test_parse_student_analytics() {
        let json = r#"{"total_interviews": 2, "average_score": 64.0, "trend": "declining",
            "skills": {"technical": 60.0, "communication": 70.0, "problem_solving": 55.5},
            "recent_interviews": [{"date": "2025-02-20", "interview_type": "aptitude", "score": 58, "duration": 30}],
            "performance_summary": {"recent_average": 58.0, "overall_average": 64.0, "improvement": -11.0}}"#;
        let analytics: StudentAnalytics = serde_json::from_str(json).unwrap();
        assert_eq!(analytics.trend, ScoreTrend::Declining);
        assert_eq!(analytics.recent_interviews[0].interview_type, InterviewType::Aptitude);
        assert_eq!(analytics.recent_interviews[0].score, 58.0);
    }

    #[test]
    fn test_period_query_values() {
        assert_eq!(PerformancePeriod::default().as_str(), "30d");
        assert_eq!(PerformancePeriod::Week.to_string(), "7d");
        assert_eq!("90d".parse::<PerformancePeriod>(), Ok(PerformancePeriod::Quarter));
        assert!("1y".parse::<PerformancePeriod>().is_err());
    }
}
