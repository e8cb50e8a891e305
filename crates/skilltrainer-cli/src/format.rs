//! Plain-text rendering of API records for terminal output.

use chrono::{DateTime, Local, Utc};
use skilltrainer_core::models::{
    Analytics, DashboardOverview, Interview, InterviewResults, InterviewSummary, Performance,
    Resume, ResumeAnalysis, ResumeSummary, StudentAnalytics, User,
};

/// Width of the name column in list output
const NAME_WIDTH: usize = 24;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp in local time for display
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn format_score<T: std::fmt::Display>(score: Option<T>) -> String {
    score.map(|s| format!("{}", s)).unwrap_or_else(|| "-".to_string())
}

pub fn user_line(user: &User) -> String {
    format!("{} <{}> ({})", user.display_name(), user.email, user.role)
}

pub fn interview_row(row: &InterviewSummary) -> String {
    format!(
        "#{:<5} {}  {:<width$}  {:<13} {:<11} {:>3}m  score {}",
        row.id,
        format_datetime(&row.scheduled_datetime),
        truncate_string(row.student_name.as_deref().unwrap_or("-"), NAME_WIDTH),
        row.interview_type.to_string(),
        row.status.to_string(),
        row.duration_minutes,
        format_score(row.overall_score.map(|s| format!("{:.0}", s))),
        width = NAME_WIDTH,
    )
}

pub fn interview_detail(interview: &Interview) -> String {
    let mut lines = vec![
        format!("Interview #{} ({})", interview.id, interview.interview_type),
        format!("Status:    {}", interview.status),
        format!("Student:   {}", interview.student_name.as_deref().unwrap_or("-")),
        format!("Teacher:   {}", interview.teacher_name.as_deref().unwrap_or("-")),
        format!(
            "Window:    {} - {}",
            format_datetime(&interview.scheduled_datetime),
            format_datetime(&interview.end_datetime)
        ),
        format!("Duration:  {}m", interview.duration_minutes),
        format!("Score:     {}", format_score(interview.overall_score.map(|s| format!("{:.0}", s)))),
    ];
    if interview.status.is_open() {
        if let Some(remaining) = interview.time_remaining {
            lines.push(format!("Remaining: {}m", remaining));
        }
    }
    if interview.tab_switches > 0 || interview.warning_count > 0 {
        lines.push(format!(
            "Security:  {} tab switches, {} warnings",
            interview.tab_switches, interview.warning_count
        ));
    }
    if !interview.questions.is_empty() {
        lines.push(String::new());
        lines.push("Questions:".to_string());
        for q in &interview.questions {
            lines.push(format!("  {}. {}", q.question_order, q.question_text));
        }
    }
    if let Some(ref feedback) = interview.feedback {
        lines.push(String::new());
        lines.push(format!("Feedback ({}/100):", feedback.overall_score));
        for s in &feedback.strengths {
            lines.push(format!("  + {}", s));
        }
        for s in &feedback.areas_for_improvement {
            lines.push(format!("  - {}", s));
        }
    }
    lines.join("\n")
}

pub fn resume_row(row: &ResumeSummary) -> String {
    format!(
        "#{:<5} {:<width$}  {:<30} {}  score {}",
        row.id,
        truncate_string(row.student_name.as_deref().unwrap_or("-"), NAME_WIDTH),
        truncate_string(&row.file_name, 30),
        row.upload_date.as_ref().map(format_datetime).unwrap_or_else(|| "-".to_string()),
        format_score(row.overall_score),
        width = NAME_WIDTH,
    )
}

pub fn resume_detail(resume: &Resume) -> String {
    let mut lines = vec![
        format!("Resume #{}: {}", resume.id, resume.title.as_deref().unwrap_or(&resume.file_name)),
        format!("Student:  {}", resume.student_name.as_deref().unwrap_or("-")),
        format!("File:     {}", resume.file_name),
        format!("Words:    {}", format_score(resume.word_count)),
    ];
    if !resume.skills_list.is_empty() {
        lines.push(format!("Skills:   {}", resume.skills_list.join(", ")));
    }
    match resume.analysis {
        Some(ref analysis) => {
            lines.push(String::new());
            lines.push(analysis_detail(analysis));
        }
        None => lines.push("Not analyzed yet.".to_string()),
    }
    lines.join("\n")
}

pub fn analysis_detail(analysis: &ResumeAnalysis) -> String {
    let mut lines = vec![
        format!("Overall score: {}/100", analysis.overall_score),
        format!(
            "Content {} | Formatting {} | Keywords {} | Experience {}",
            analysis.content_quality_score,
            analysis.formatting_score,
            analysis.keywords_score,
            analysis.experience_relevance_score
        ),
    ];
    if !analysis.recommended_roles.is_empty() {
        lines.push(format!("Recommended roles: {}", analysis.recommended_roles.join(", ")));
    }
    if !analysis.skill_gaps.is_empty() {
        lines.push(format!("Skill gaps: {}", analysis.skill_gaps.join(", ")));
    }
    for s in &analysis.suggestions {
        lines.push(format!("  * {}", s));
    }
    lines.join("\n")
}

pub fn results_detail(results: &InterviewResults) -> String {
    let mut lines = vec![interview_detail(&results.session)];
    if let Some(ref analytics) = results.analytics {
        lines.push(format!(
            "Answered:  {}/{} ({:.0}%), avg {:.0}s per answer",
            analytics.questions_answered,
            analytics.total_questions,
            analytics.completion_percentage,
            analytics.average_response_time
        ));
    }
    if !results.responses.is_empty() {
        lines.push(String::new());
        lines.push("Answers:".to_string());
        for r in &results.responses {
            lines.push(format!(
                "  {}. {} [{}]",
                r.question_order.unwrap_or_default(),
                truncate_string(r.question_text.as_deref().unwrap_or("-"), 60),
                format_score(r.score)
            ));
            if !r.ai_feedback.is_empty() {
                lines.push(format!("     {}", truncate_string(&r.ai_feedback, 72)));
            }
        }
    }
    lines.join("\n")
}

pub fn overview_detail(overview: &DashboardOverview) -> String {
    match overview {
        DashboardOverview::Administrator(o) => [
            format!(
                "Users:      {} ({} students, {} teachers, {} new this week)",
                o.total_users, o.total_students, o.total_teachers, o.new_users_this_week
            ),
            format!(
                "Interviews: {} total, {} completed, {} this week",
                o.total_interviews, o.completed_interviews, o.interviews_this_week
            ),
            format!("Average:    {:.1}", o.average_score),
            format!("Alerts:     {}", o.alerts.len()),
        ]
        .join("\n"),
        DashboardOverview::Teacher(o) => [
            format!("Students:   {} ({} active)", o.total_students, o.active_students),
            format!(
                "Interviews: {} conducted, {} this month",
                o.interviews_conducted, o.interviews_this_month
            ),
            format!("Average:    {:.1}", o.average_student_score),
            format!("Pending:    {} reviews", o.pending_reviews.len()),
        ]
        .join("\n"),
        DashboardOverview::Student(o) => [
            format!(
                "Interviews: {} total, {} completed",
                o.total_interviews, o.completed_interviews
            ),
            format!("Average:    {:.1} ({})", o.average_score, o.score_trend),
            format!(
                "Skills:     technical {:.0} | communication {:.0} | aptitude {:.0}",
                o.technical_average, o.communication_average, o.aptitude_average
            ),
            format!("Streak:     {} days", o.streak_days),
            format!(
                "Next:       {}",
                if o.next_interview.is_some() { "scheduled" } else { "none" }
            ),
        ]
        .join("\n"),
    }
}

pub fn analytics_detail(analytics: &Analytics) -> String {
    let mut lines = vec!["Score distribution:".to_string()];
    for (band, count) in &analytics.performance_distribution {
        lines.push(format!("  {:>6}  {}", band, count));
    }
    lines.push("Average by interview type:".to_string());
    for (kind, avg) in &analytics.skill_analysis {
        lines.push(format!("  {:<13} {:.1}", kind, avg));
    }
    let new_users: i64 = analytics.user_growth.iter().map(|g| g.count).sum();
    let interviews: i64 = analytics.interview_trends.iter().map(|t| t.count).sum();
    lines.push(format!("Accounts: {}  Interviews: {}", new_users, interviews));
    lines.join("\n")
}

pub fn performance_detail(performance: &Performance) -> String {
    let mut lines = vec![format!(
        "{} completed in {}{}, average {:.1}",
        performance.total_interviews,
        performance.period,
        performance
            .category
            .map(|c| format!(" ({})", c))
            .unwrap_or_default(),
        performance.average_score
    )];
    for day in &performance.daily_trends {
        lines.push(format!(
            "  {}  {:>3}  {}",
            day.date,
            day.count,
            format_score(day.avg_score.map(|s| format!("{:.1}", s)))
        ));
    }
    lines.join("\n")
}

pub fn student_analytics_detail(analytics: &StudentAnalytics) -> String {
    let summary = &analytics.performance_summary;
    let mut lines = vec![
        format!(
            "Interviews: {}  Average: {:.1}  Trend: {}",
            analytics.total_interviews, analytics.average_score, analytics.trend
        ),
        format!(
            "Skills:     technical {:.1} | communication {:.1} | problem solving {:.1}",
            analytics.skills.technical, analytics.skills.communication, analytics.skills.problem_solving
        ),
        format!(
            "Last 30d:   {:.1} ({:+.1})",
            summary.recent_average, summary.improvement
        ),
    ];
    for i in &analytics.recent_interviews {
        lines.push(format!(
            "  {}  {:<13} {:>5.1}  {}m",
            i.date,
            i.interview_type.to_string(),
            i.score,
            i.duration
        ));
    }
    lines.join("\n")
}
