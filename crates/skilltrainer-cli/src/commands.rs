//! Command parsing and handlers.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use skilltrainer_core::models::{
    InterviewType, PerformancePeriod, RegisterRequest, ResumeUpload, UserRole,
};
use skilltrainer_core::{ApiClient, Config};

use crate::format;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(Option<String>),
    Register,
    Logout,
    Whoami,
    Status,
    Ping,
    Interviews(Option<i64>),
    Results(i64),
    DeleteInterview(i64),
    Resumes(Option<i64>),
    UploadResume {
        student_id: i64,
        file: PathBuf,
        title: Option<String>,
    },
    AnalyzeResume(i64),
    Dashboard,
    Analytics,
    Performance {
        period: PerformancePeriod,
        category: Option<InterviewType>,
    },
    StudentAnalytics(i64),
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some(name) = args.first() else {
            return Ok(Command::Help);
        };
        let rest = &args[1..];
        let command = match name.as_str() {
            "login" => Command::Login(rest.first().cloned()),
            "register" => Command::Register,
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "status" => Command::Status,
            "ping" => Command::Ping,
            "interviews" => Command::Interviews(optional_id(rest)?),
            "results" => Command::Results(required_id(rest, name)?),
            "delete-interview" => Command::DeleteInterview(required_id(rest, name)?),
            "resumes" => Command::Resumes(optional_id(rest)?),
            "upload-resume" => {
                let student_id = required_id(rest, name)?;
                let file = rest
                    .get(1)
                    .map(PathBuf::from)
                    .context("upload-resume requires a file")?;
                let title = rest.get(2..).filter(|t| !t.is_empty()).map(|t| t.join(" "));
                Command::UploadResume {
                    student_id,
                    file,
                    title,
                }
            }
            "analyze-resume" => Command::AnalyzeResume(required_id(rest, name)?),
            "dashboard" => Command::Dashboard,
            "analytics" => Command::Analytics,
            "performance" => {
                let period = match rest.first() {
                    Some(p) => p.parse::<PerformancePeriod>().map_err(anyhow::Error::msg)?,
                    None => PerformancePeriod::default(),
                };
                let category = rest
                    .get(1)
                    .map(|c| c.parse::<InterviewType>())
                    .transpose()
                    .map_err(anyhow::Error::msg)?;
                Command::Performance { period, category }
            }
            "student-analytics" => Command::StudentAnalytics(required_id(rest, name)?),
            "help" | "-h" | "--help" => Command::Help,
            other => anyhow::bail!("Unknown command: {}", other),
        };
        Ok(command)
    }
}

fn optional_id(rest: &[String]) -> Result<Option<i64>> {
    rest.first()
        .map(|s| s.parse::<i64>().with_context(|| format!("Invalid id: {}", s)))
        .transpose()
}

fn required_id(rest: &[String], command: &str) -> Result<i64> {
    optional_id(rest)?.ok_or_else(|| anyhow::anyhow!("{} requires an id", command))
}

pub fn print_usage() {
    eprintln!(
        "Usage: skilltrainer <command>

Commands:
  login [email]            Sign in and store the session tokens
  register                 Create a teacher or administrator account
  logout                   Sign out and clear the stored tokens
  whoami                   Show the signed-in user
  status                   Show local session state
  ping                     Check backend connectivity
  interviews [id]          List interviews, or show one
  results <id>             Answers and feedback of a completed interview
  delete-interview <id>    Delete an interview
  resumes [id]             List resumes, or show one
  upload-resume <student-id> <file> [title]
                           Upload a resume (.pdf, .doc, .docx, .txt)
  analyze-resume <id>      Re-run the analysis of a resume
  dashboard                Overview for the signed-in role
  analytics                Platform analytics (administrators)
  performance [7d|30d|90d] [type]
                           Interview performance trend
  student-analytics <id>   Score history of a student"
    );
}

pub async fn run(command: Command, api: &ApiClient, config: &mut Config) -> Result<()> {
    match command {
        Command::Login(email) => login(api, config, email).await,
        Command::Register => register(api, config).await,
        Command::Logout => {
            api.logout().await?;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            let user = api.current_user().await?;
            println!("{}", format::user_line(&user));
            Ok(())
        }
        Command::Status => {
            let session = api.session();
            println!("Server:  {}", config.api_base_url);
            println!("Session: {}", session.state());
            println!("Store:   {:?}", config.token_store);
            Ok(())
        }
        Command::Ping => {
            let status = api.check_connectivity().await?;
            println!(
                "{} ({}{})",
                status.message,
                status.status,
                status.version.map(|v| format!(", v{}", v)).unwrap_or_default()
            );
            Ok(())
        }
        Command::Interviews(None) => {
            let rows = api.list_interviews().await?;
            print_lines(rows.iter().map(format::interview_row), "No interviews.");
            Ok(())
        }
        Command::Interviews(Some(id)) => {
            let interview = api.get_interview(id).await?;
            println!("{}", format::interview_detail(&interview));
            Ok(())
        }
        Command::Results(id) => {
            let results = api.interview_results(id).await?;
            println!("{}", format::results_detail(&results));
            Ok(())
        }
        Command::DeleteInterview(id) => {
            api.delete_interview(id).await?;
            println!("Interview {} deleted.", id);
            Ok(())
        }
        Command::Resumes(None) => {
            let rows = api.list_resumes().await?;
            print_lines(rows.iter().map(format::resume_row), "No resumes.");
            Ok(())
        }
        Command::Resumes(Some(id)) => {
            let resume = api.get_resume(id).await?;
            println!("{}", format::resume_detail(&resume));
            Ok(())
        }
        Command::UploadResume {
            student_id,
            file,
            title,
        } => {
            let mut upload = ResumeUpload::from_path(student_id, &file)?;
            if let Some(title) = title {
                upload = upload.with_title(title);
            }
            let resume = api.upload_resume(&upload).await?;
            println!("{}", format::resume_detail(&resume));
            Ok(())
        }
        Command::AnalyzeResume(id) => {
            match api.analyze_resume(id).await? {
                Some(analysis) => println!("{}", format::analysis_detail(&analysis)),
                None => println!("Analysis requested for resume {}.", id),
            }
            Ok(())
        }
        Command::Dashboard => {
            let (user, overview) =
                futures::future::try_join(api.current_user(), api.dashboard_overview()).await?;
            println!("{}", format::user_line(&user));
            println!();
            println!("{}", format::overview_detail(&overview));
            Ok(())
        }
        Command::Analytics => {
            let analytics = api.analytics().await?;
            println!("{}", format::analytics_detail(&analytics));
            Ok(())
        }
        Command::Performance { period, category } => {
            let performance = api.performance(period, category).await?;
            println!("{}", format::performance_detail(&performance));
            Ok(())
        }
        Command::StudentAnalytics(id) => {
            let analytics = api.student_analytics(id).await?;
            println!("{}", format::student_analytics_detail(&analytics));
            Ok(())
        }
        Command::Help => {
            print_usage();
            Ok(())
        }
    }
}

fn print_lines(lines: impl Iterator<Item = String>, empty: &str) {
    let mut any = false;
    for line in lines {
        println!("{}", line);
        any = true;
    }
    if !any {
        println!("{}", empty);
    }
}

async fn login(api: &ApiClient, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    if email.is_empty() {
        anyhow::bail!("Email required");
    }
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password required");
    }

    let user = api.login(&email, &password).await?;
    remember_email(config, email);
    println!("Logged in as {}.", format::user_line(&user));
    Ok(())
}

async fn register(api: &ApiClient, config: &mut Config) -> Result<()> {
    let role = match prompt("Role (teacher/administrator): ")?.to_ascii_lowercase().as_str() {
        "teacher" => UserRole::Teacher,
        "administrator" | "admin" => UserRole::Administrator,
        "student" => UserRole::Student,
        other => anyhow::bail!("Unknown role: {}", other),
    };
    let email = prompt("Email: ")?;
    let first_name = prompt("First name: ")?;
    let last_name = prompt("Last name: ")?;
    let password = rpassword::prompt_password("Password: ")?;
    let password_confirm = rpassword::prompt_password("Confirm password: ")?;

    let registration = RegisterRequest {
        username: None,
        email: email.clone(),
        password,
        password_confirm,
        first_name,
        last_name,
        role,
        phone_number: None,
    };
    let user = api.register(&registration).await?;
    remember_email(config, email);
    println!("Registered and logged in as {}.", format::user_line(&user));
    Ok(())
}

fn remember_email(config: &mut Config, email: String) {
    config.last_email = Some(email);
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
