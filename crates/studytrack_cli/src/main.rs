//! `studytrack` command-line front end.
//!
//! # Responsibility
//! - Resolve `CoreConfig` from the environment and command-line overrides.
//! - Open the study store once and hand repository handles to services.
//! - Render results as text or JSON.

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::{error, warn};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use studytrack_core::db::open_db;
use studytrack_core::{
    init_logging, Content, ContentPatch, ContentService, CoreConfig, DashboardService,
    NewContent, NewSubject, SqliteContentRepository, SqliteSubjectRepository, Subject,
    SubjectPatch, SubjectService,
};
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Track study subjects and spaced-repetition reviews
#[derive(Parser)]
#[command(name = "studytrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database file (overrides STUDYTRACK_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling logs (overrides STUDYTRACK_LOG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage subjects
    #[command(subcommand)]
    Subject(SubjectCommand),

    /// Manage content items
    #[command(subcommand)]
    Content(ContentCommand),

    /// Record that a content item was studied today
    Study {
        #[arg(value_name = "CONTENT_ID")]
        id: Uuid,
    },

    /// Show due and overdue items
    Review {
        /// Only show the study session for one subject
        #[arg(long, value_name = "SUBJECT_ID")]
        subject: Option<Uuid>,
    },

    /// Show review counts per subject
    Dashboard,
}

#[derive(Subcommand)]
enum SubjectCommand {
    /// Create a subject
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List subjects by name
    List,
    /// Change name or description; an empty description clears it
    Edit {
        #[arg(value_name = "SUBJECT_ID")]
        id: Uuid,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a subject and all of its content
    Remove {
        #[arg(value_name = "SUBJECT_ID")]
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum ContentCommand {
    /// Create a content item under a subject
    Add {
        #[arg(value_name = "SUBJECT_ID")]
        subject: Uuid,
        title: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List content items by next review date
    List {
        #[arg(long, value_name = "SUBJECT_ID")]
        subject: Option<Uuid>,
    },
    /// Show one item with its study history
    Show {
        #[arg(value_name = "CONTENT_ID")]
        id: Uuid,
    },
    /// Change title, description or owning subject
    Edit(ContentEditArgs),
    /// Delete a content item
    Remove {
        #[arg(value_name = "CONTENT_ID")]
        id: Uuid,
    },
}

#[derive(Args)]
struct ContentEditArgs {
    #[arg(value_name = "CONTENT_ID")]
    id: Uuid,
    #[arg(short, long)]
    title: Option<String>,
    #[arg(short, long)]
    description: Option<String>,
    /// Move the item to another subject
    #[arg(long, value_name = "SUBJECT_ID")]
    subject: Option<Uuid>,
}

/// Content row as printed by list/show/review commands.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentView<'a> {
    #[serde(flatten)]
    content: &'a Content,
    status: &'static str,
    days_overdue: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    if let Some(log_dir) = config.log_dir.as_ref() {
        if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("warning: file logging disabled: {err}");
        }
    }

    let conn = open_db(&config.db_path)?;
    let json = cli.json;

    match cli.command {
        Commands::Subject(command) => {
            let service = SubjectService::new(SqliteSubjectRepository::try_new(&conn)?);
            run_subject(&service, command, json)
        }
        Commands::Content(command) => {
            let service = ContentService::new(SqliteContentRepository::try_new(&conn)?);
            run_content(&service, command, json)
        }
        Commands::Study { id } => {
            let service = ContentService::new(SqliteContentRepository::try_new(&conn)?);
            let studied = service.register_study(id)?;
            if json {
                print_json(&view(&service, &studied))
            } else {
                println!(
                    "studied `{}`: level {} -> next review {} ({})",
                    studied.title,
                    studied.review_level,
                    studied.next_review_date,
                    service.status_of(&studied).label()
                );
                Ok(())
            }
        }
        Commands::Review { subject } => {
            let service = ContentService::new(SqliteContentRepository::try_new(&conn)?);
            run_review(&service, subject, json)
        }
        Commands::Dashboard => {
            let service = DashboardService::new(
                SqliteSubjectRepository::try_new(&conn)?,
                SqliteContentRepository::try_new(&conn)?,
            )
            .with_daily_goal(config.daily_goal);
            let dashboard = service.load()?;
            if json {
                return print_json(&dashboard);
            }
            let stats = &dashboard.stats;
            println!("{}", Local::now().format("%A, %B %-d"));
            println!(
                "subjects={} contents={} due={} overdue={} completed={} goal={}",
                stats.total_subjects,
                stats.total_contents,
                stats.due_today,
                stats.overdue,
                stats.completed,
                stats.daily_goal
            );
            for row in &dashboard.subjects {
                println!(
                    "{}  [{}] {}  cards={} due={} overdue={} mastery={}%{}",
                    row.subject_uuid,
                    row.category.icon(),
                    row.name,
                    row.total_cards,
                    row.due_cards,
                    row.overdue_cards,
                    row.average_mastery,
                    if row.is_done { "  done" } else { "" }
                );
            }
            Ok(())
        }
    }
}

fn run_subject(
    service: &SubjectService<SqliteSubjectRepository<'_>>,
    command: SubjectCommand,
    json: bool,
) -> CliResult<()> {
    match command {
        SubjectCommand::Add { name, description } => {
            let subject = service.create_subject(NewSubject { name, description })?;
            print_subject(&subject, json)
        }
        SubjectCommand::List => {
            let subjects = service.list_subjects()?;
            if json {
                return print_json(&subjects);
            }
            for subject in &subjects {
                print_subject(subject, false)?;
            }
            Ok(())
        }
        SubjectCommand::Edit {
            id,
            name,
            description,
        } => {
            let subject = service.update_subject(id, SubjectPatch { name, description })?;
            print_subject(&subject, json)
        }
        SubjectCommand::Remove { id } => {
            let removed = service.delete_subject(id)?;
            if json {
                return print_json(&Removal::subject(id, removed));
            }
            println!("removed subject {id} and {removed} content item(s)");
            Ok(())
        }
    }
}

fn run_content(
    service: &ContentService<SqliteContentRepository<'_>>,
    command: ContentCommand,
    json: bool,
) -> CliResult<()> {
    match command {
        ContentCommand::Add {
            subject,
            title,
            description,
        } => {
            let content = service.create_content(NewContent {
                subject_uuid: subject,
                title,
                description,
            })?;
            print_contents(service, std::slice::from_ref(&content), json)
        }
        ContentCommand::List { subject } => {
            let contents = match subject {
                Some(subject_uuid) => service.list_by_subject(subject_uuid)?,
                None => service.list_contents()?,
            };
            print_contents(service, &contents, json)
        }
        ContentCommand::Show { id } => {
            let content = service
                .get_content(id)?
                .ok_or_else(|| format!("content not found: {id}"))?;
            if json {
                return print_json(&view(service, &content));
            }
            print_contents(service, std::slice::from_ref(&content), false)?;
            if let Some(description) = content.description.as_deref() {
                println!("  {description}");
            }
            for (index, event) in content.study_history.iter().enumerate() {
                match studytrack_core::scheduler::local_date_of(event.studied_at) {
                    Some(date) => println!("  review {}: {date}", index + 1),
                    None => warn!(
                        "event=cli_show module=cli status=warn content_uuid={id} bad_timestamp={}",
                        event.studied_at
                    ),
                }
            }
            Ok(())
        }
        ContentCommand::Edit(args) => {
            let content = service.update_content(
                args.id,
                ContentPatch {
                    subject_uuid: args.subject,
                    title: args.title,
                    description: args.description,
                },
            )?;
            print_contents(service, std::slice::from_ref(&content), json)
        }
        ContentCommand::Remove { id } => {
            service.delete_content(id)?;
            if json {
                return print_json(&Removal::content(id));
            }
            println!("removed content {id}");
            Ok(())
        }
    }
}

fn run_review(
    service: &ContentService<SqliteContentRepository<'_>>,
    subject: Option<Uuid>,
    json: bool,
) -> CliResult<()> {
    if let Some(subject_uuid) = subject {
        let session = service.study_session(subject_uuid)?;
        return print_contents(service, &session, json);
    }

    let due = service.due_today()?;
    let overdue = service.overdue()?;
    if json {
        let due: Vec<_> = due.iter().map(|content| view(service, content)).collect();
        let overdue: Vec<_> = overdue
            .iter()
            .map(|content| view(service, content))
            .collect();
        return print_json(&serde_json::json!({ "dueToday": due, "overdue": overdue }));
    }

    println!("due today ({})", due.len());
    print_contents(service, &due, false)?;
    println!("overdue ({})", overdue.len());
    for content in &overdue {
        println!(
            "{}  {}  overdue by {} day(s)",
            content.uuid,
            content.title,
            service.overdue_days_of(content)
        );
    }
    Ok(())
}

fn view<'a>(
    service: &ContentService<SqliteContentRepository<'_>>,
    content: &'a Content,
) -> ContentView<'a> {
    ContentView {
        content,
        status: service.status_of(content).as_str(),
        days_overdue: service.overdue_days_of(content),
    }
}

fn print_subject(subject: &Subject, json: bool) -> CliResult<()> {
    if json {
        return print_json(subject);
    }
    match subject.description.as_deref() {
        Some(description) => println!("{}  {}  ({description})", subject.uuid, subject.name),
        None => println!("{}  {}", subject.uuid, subject.name),
    }
    Ok(())
}

fn print_contents(
    service: &ContentService<SqliteContentRepository<'_>>,
    contents: &[Content],
    json: bool,
) -> CliResult<()> {
    if json {
        let views: Vec<_> = contents
            .iter()
            .map(|content| view(service, content))
            .collect();
        return print_json(&views);
    }
    for content in contents {
        println!(
            "{}  {}  level={} next={} [{}]",
            content.uuid,
            content.title,
            content.review_level,
            content.next_review_date,
            service.status_of(content).label()
        );
    }
    Ok(())
}

/// `--json` payload of the remove commands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Removal {
    id: Uuid,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed_contents: Option<usize>,
}

impl Removal {
    fn subject(id: Uuid, removed_contents: usize) -> Self {
        Self {
            id,
            kind: "subject",
            removed_contents: Some(removed_contents),
        }
    }

    fn content(id: Uuid) -> Self {
        Self {
            id,
            kind: "content",
            removed_contents: None,
        }
    }
}

fn print_json(value: &impl Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Removal;
    use uuid::Uuid;

    #[test]
    fn subject_removal_reports_cascaded_contents() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(Removal::subject(id, 3)).unwrap();
        assert_eq!(value["id"], id.to_string());
        assert_eq!(value["kind"], "subject");
        assert_eq!(value["removedContents"], 3);
    }

    #[test]
    fn content_removal_omits_content_count() {
        let value = serde_json::to_value(Removal::content(Uuid::new_v4())).unwrap();
        assert_eq!(value["kind"], "content");
        assert!(value.get("removedContents").is_none());
    }
}
