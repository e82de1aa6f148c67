use anyhow::{anyhow, Context, Result};
use autoassign_core::{
    compute_exclusions, evaluate_gates, parse_utc_offset, select_for_event, unavailable_on, utc,
    weekday_at, weekday_name, Config, PullRequestDetails, Role, Selection,
};
use chrono::{Utc, Weekday};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Autoassign: pick reviewers and assignees for pull requests
#[derive(Parser, Debug)]
#[command(name = "autoassign")]
#[command(about = "Reviewer and assignee selection for pull requests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show who would be picked for a hypothetical pull request
    Simulate(SimulateArgs),
    /// Validate a configuration file and print a summary
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Path to the JSON or TOML configuration file
    #[arg(long, default_value = "auto_assign.toml")]
    config: PathBuf,

    /// Login of the pull request author
    #[arg(long)]
    author: String,

    /// Pull request title
    #[arg(long, default_value = "")]
    title: String,

    /// Treat the pull request as a draft
    #[arg(long)]
    draft: bool,

    /// Labels on the pull request (repeatable)
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Weekday to evaluate availability for (e.g. Monday); defaults to today
    #[arg(long, conflicts_with = "utc_offset")]
    weekday: Option<String>,

    /// UTC offset used to decide today's weekday (e.g. +09:00)
    #[arg(long)]
    utc_offset: Option<String>,

    /// Seed for reproducible selections
    #[arg(long)]
    seed: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Path to the JSON or TOML configuration file
    #[arg(long, default_value = "auto_assign.toml")]
    config: PathBuf,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    weekday: &'static str,
    /// Gate message when processing stopped early.
    skipped: Option<String>,
    unavailable: Vec<String>,
    #[serde(flatten)]
    selection: Selection,
}

fn load_config(path: &Path) -> Result<Config> {
    Config::from_path(path).with_context(|| format!("Failed to load config {}", path.display()))
}

fn resolve_weekday(weekday: Option<&str>, utc_offset: Option<&str>) -> Result<Weekday> {
    if let Some(name) = weekday {
        return name
            .parse::<Weekday>()
            .map_err(|_| anyhow!("Unknown weekday: {}", name));
    }

    let offset = match utc_offset {
        Some(raw) => parse_utc_offset(raw)?,
        None => utc(),
    };
    Ok(weekday_at(Utc::now(), offset))
}

fn simulate<R: Rng>(
    config: &Config,
    pr: &PullRequestDetails,
    today: Weekday,
    rng: &mut R,
) -> Result<SimulationReport> {
    let availability = config.availability_exceptions.as_ref();
    let unavailable = unavailable_on(today, availability);

    if let Some(gate) = evaluate_gates(pr, config) {
        return Ok(SimulationReport {
            weekday: weekday_name(today),
            skipped: Some(gate.to_string()),
            unavailable,
            selection: Selection::default(),
        });
    }

    let exclusions = compute_exclusions(&pr.author, today, availability)?;
    let selection = select_for_event(&pr.author, config, &exclusions, rng);

    Ok(SimulationReport {
        weekday: weekday_name(today),
        skipped: None,
        unavailable,
        selection,
    })
}

fn print_role(label: &str, picked: &Option<Vec<String>>) {
    match picked {
        None => println!("{}: disabled", label),
        Some(logins) if logins.is_empty() => println!("{}: none available", label),
        Some(logins) => println!("{}: {}", label, logins.join(", ")),
    }
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let today = resolve_weekday(args.weekday.as_deref(), args.utc_offset.as_deref())?;

    let pr = PullRequestDetails {
        author: args.author,
        title: args.title,
        draft: args.draft,
        labels: args.labels,
    };

    let report = match args.seed {
        Some(seed) => simulate(&config, &pr, today, &mut StdRng::seed_from_u64(seed))?,
        None => simulate(&config, &pr, today, &mut rand::rng())?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Weekday: {}", report.weekday);
    if !report.unavailable.is_empty() {
        println!("Unavailable: {}", report.unavailable.join(", "));
    }
    if let Some(reason) = &report.skipped {
        println!("{}", reason);
        return Ok(());
    }
    print_role("Reviewers", &report.selection.reviewers);
    print_role("Assignees", &report.selection.assignees);

    Ok(())
}

fn describe_pool(config: &Config, role: Role) -> String {
    match config.pool(role) {
        autoassign_core::Pool::Flat(logins) => format!("{} candidates", logins.len()),
        autoassign_core::Pool::Groups(groups) => {
            let names: Vec<&str> = groups.keys().map(String::as_str).collect();
            format!("{} groups ({})", groups.len(), names.join(", "))
        }
    }
}

fn run_check(args: CheckArgs) -> Result<()> {
    let config = load_config(&args.config)?;

    println!("{}: OK", args.config.display());
    for role in [Role::Reviewers, Role::Assignees] {
        if config.is_enabled(role) {
            println!(
                "  {}: {} from {}",
                role,
                config.requested_count(role),
                describe_pool(&config, role)
            );
        } else {
            println!("  {}: disabled", role);
        }
    }
    if !config.skip_keywords.is_empty() {
        println!("  skip keywords: {}", config.skip_keywords.join(", "));
    }
    if config.run_on_draft {
        println!("  runs on draft pull requests");
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => run_simulate(args),
        Commands::Check(args) => run_check(args),
    }
}
