#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # quizgrade
//!
//! Bulk-grades free-text quiz answers with an LLM and manages the rosters
//! that map anonymous student ids back to people.
//!
//! Live grading needs `OPENAI_API_KEY` (or `ANTHROPIC_API_KEY`) in the
//! environment or a `.env` file. `--dry-run` needs nothing.

use std::{path::PathBuf, str::FromStr, sync::Arc};

use anyhow::{Context as _, Result, bail};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use quizgrade::{
    Context, GradeMap, GraderConfig, Grader, OpenAiCapability, ResponseSet, dry_run,
    roster::Roster,
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Arguments of the `grade` command.
#[derive(Debug, Clone)]
struct GradeArgs {
    /// Where to write grades; stdout when absent.
    output:      Option<PathBuf>,
    /// Build prompts without calling the API.
    dry_run:     bool,
    /// Model override.
    model:       Option<String>,
    /// Concurrency override.
    concurrency: Option<usize>,
    /// Context document.
    context:     PathBuf,
    /// Responses document.
    responses:   PathBuf,
}

/// How to find a student in a roster.
#[derive(Debug, Clone)]
enum LookupKey {
    /// By generated id.
    Id(String),
    /// By email, ignoring case.
    Email(String),
}

/// Output format of `roster list`.
#[derive(Debug, Clone, Copy)]
enum ListFormat {
    /// Human readable table.
    Table,
    /// JSON object of students.
    Json,
}

impl FromStr for ListFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "table" => Ok(ListFormat::Table),
            "json" => Ok(ListFormat::Json),
            other => Err(format!("expected `table` or `json`, got `{other}`")),
        }
    }
}

/// Roster subcommands.
#[derive(Debug, Clone)]
enum RosterCmd {
    /// Create a roster from a form export
    Create(PathBuf, PathBuf),
    /// Look up one student
    Lookup(LookupKey, PathBuf),
    /// List every student
    List(ListFormat, PathBuf),
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade responses
    Grade(GradeArgs),
    /// Roster management
    Roster(RosterCmd),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses a roster file path
    fn roster_path() -> impl Parser<PathBuf> {
        positional::<PathBuf>("ROSTER").help("Path to roster file (.yaml, .yml or .json)")
    }

    let output = short('o')
        .long("output")
        .help("Output file for grades (default: stdout)")
        .argument::<PathBuf>("FILE")
        .optional();
    let dry_run = long("dry-run")
        .help("Show prompts without calling the API")
        .switch();
    let model = long("model")
        .help("Model to grade with")
        .argument::<String>("MODEL")
        .optional();
    let concurrency = long("concurrency")
        .help("Maximum grading calls in flight (default: 1)")
        .argument::<usize>("N")
        .optional();
    let context = positional::<PathBuf>("CONTEXT").help("Path to context JSON (quiz, rubric, calibration)");
    let responses =
        positional::<PathBuf>("RESPONSES").help("Path to responses JSON (studentId -> answers)");

    let grade = construct!(GradeArgs {
        output,
        dry_run,
        model,
        concurrency,
        context,
        responses
    })
    .to_options()
    .command("grade")
    .help("Grade student quiz responses")
    .map(Cmd::Grade);

    let roster_output = short('o')
        .long("output")
        .help("Output roster file (.yaml or .json)")
        .argument::<PathBuf>("FILE");
    let export = positional::<PathBuf>("RESPONSES").help("Path to form responses JSON");
    let roster_create = construct!(RosterCmd::Create(roster_output, export))
        .to_options()
        .command("create")
        .help("Create roster from responses");

    let id = long("id")
        .help("Student ID to look up")
        .argument::<String>("ID")
        .map(LookupKey::Id);
    let email = long("email")
        .help("Email to look up")
        .argument::<String>("EMAIL")
        .map(LookupKey::Email);
    let key = construct!([id, email]);
    let roster = roster_path();
    let roster_lookup = construct!(RosterCmd::Lookup(key, roster))
        .to_options()
        .command("lookup")
        .help("Look up student in roster");

    let format = long("format")
        .help("Output format: table or json")
        .argument::<ListFormat>("FORMAT")
        .fallback(ListFormat::Table);
    let roster = roster_path();
    let roster_list = construct!(RosterCmd::List(format, roster))
        .to_options()
        .command("list")
        .help("List all students in roster");

    let roster = construct!([roster_create, roster_lookup, roster_list])
        .to_options()
        .command("roster")
        .help("Manage student rosters")
        .map(Cmd::Roster);

    let cmd = construct!([grade, roster]);

    cmd.to_options()
        .descr("Bulk grade student quiz responses using an LLM")
        .run()
}

/// Runs the `grade` command.
async fn grade(args: GradeArgs) -> Result<()> {
    let context = Context::load(&args.context)
        .with_context(|| format!("Failed to load context from {}", args.context.display()))?;
    let responses = ResponseSet::load(&args.responses).with_context(|| {
        format!("Failed to load responses from {}", args.responses.display())
    })?;

    let grades: GradeMap = if args.dry_run {
        let banner = "=".repeat(60);
        println!("{}", banner.yellow());
        println!("{}", "DRY RUN - No API calls will be made".yellow().bold());
        println!("{}", banner.yellow());

        let report = dry_run(&context, &responses);
        println!("{report}");
        report.grades
    } else {
        let config = GraderConfig::from_env()
            .with_model(args.model)
            .with_concurrency(args.concurrency);
        let capability = OpenAiCapability::new(&config).context("Cannot start grading")?;

        Grader::builder()
            .capability(Arc::new(capability))
            .model(config.model())
            .concurrency(config.concurrency())
            .build()
            .grade(&context, &responses)
            .await
    };

    let output = serde_json::to_string_pretty(&grades)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, output)
                .with_context(|| format!("Could not write grades to {}", path.display()))?;
            println!("Grades written to {}", path.display());
        }
        None if !args.dry_run => println!("{output}"),
        None => {}
    }

    Ok(())
}

/// Runs a `roster` subcommand.
fn roster(cmd: RosterCmd) -> Result<()> {
    match cmd {
        RosterCmd::Create(output, export) => {
            let roster = Roster::create(&export)?;
            roster.save(&output)?;
            println!(
                "Created roster with {} students: {}",
                roster.students.len(),
                output.display()
            );
        }
        RosterCmd::Lookup(key, path) => {
            let roster = Roster::load(&path)?;
            match key {
                LookupKey::Id(id) => match roster.lookup_by_id(&id) {
                    Some(entry) => {
                        println!("Student {id}:");
                        println!("{}", serde_json::to_string_pretty(entry)?);
                    }
                    None => bail!("Student {id} not found"),
                },
                LookupKey::Email(email) => match roster.lookup_by_email(&email) {
                    Some((id, entry)) => {
                        println!("Student {id}:");
                        println!("{}", serde_json::to_string_pretty(entry)?);
                    }
                    None => bail!("Email {email} not found"),
                },
            }
        }
        RosterCmd::List(format, path) => {
            let roster = Roster::load(&path)?;
            match format {
                ListFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&roster.students)?)
                }
                ListFormat::Table => println!("{}", roster.table()),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match options() {
        Cmd::Grade(args) => grade(args).await,
        Cmd::Roster(cmd) => roster(cmd),
    }
}
