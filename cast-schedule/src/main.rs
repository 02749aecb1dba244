//! cast-schedule - Schedule posts at each platform's optimal time
//!
//! Unix-style tool that previews a scheduled post or suggests posting times.
//! Nothing is published.

use chrono::{DateTime, Utc};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use libcastwise::config::LoggingSettings;
use libcastwise::logging::LoggingConfig;
use libcastwise::report::{
    format_post, format_suggestions, post_json, suggestions_json, OutputFormat, PREVIEW_NOTE,
};
use libcastwise::scheduling::parse_timestamp;
use libcastwise::service::scheduling::ScheduleRequest;
use libcastwise::types::{split_media_list, split_platform_list};
use libcastwise::{CastwiseError, CastwiseService, PlatformKey, Result};

#[derive(Parser, Debug)]
#[command(name = "cast-schedule")]
#[command(version)]
#[command(about = "Schedule posts at each platform's optimal time")]
#[command(long_about = "\
cast-schedule - Schedule posts at each platform's optimal time

DESCRIPTION:
    cast-schedule builds a scheduled post for one or more platforms. Without
    --time the post lands on the next optimal hour of the first platform.
    Explicit times must be ISO-8601 instants no more than 30 days ahead.
    The result is a preview; nothing is published.

USAGE EXAMPLES:
    # Schedule at the next optimal time for x
    cast-schedule --platforms x,linkedin --content \"Launch day!\"

    # Schedule at an explicit time with media
    cast-schedule --platforms tiktok --content \"Demo\" \\
        --time 2025-01-21T18:00:00Z --media clip.mp4

    # Show optimal posting windows
    cast-schedule --suggest-time --platforms x,youtube

    # Machine-readable output
    cast-schedule --platforms x --content \"Hi\" --format json

SUPPORTED PLATFORMS:
    x, linkedin, facebook, threads, tiktok, youtube

CONFIGURATION:
    Configuration file: ~/.config/castwise/config.toml

    Override with environment variables:
        CASTWISE_CONFIG       - Path to config file
        CASTWISE_LOG_FORMAT   - text, json or pretty
        CASTWISE_LOG_LEVEL    - error, warn, info, debug, trace

EXIT CODES:
    0 - Success (or help shown)
    1 - Invalid input (unrecognized flag, missing content, unknown platform,
        bad time, etc.)
")]
struct Cli {
    /// Comma-separated target platforms
    #[arg(long, value_name = "LIST")]
    platforms: Option<String>,

    /// Post content
    #[arg(long)]
    content: Option<String>,

    /// ISO-8601 time to post at (default: next optimal time)
    #[arg(long)]
    time: Option<String>,

    /// Comma-separated media files or URLs
    #[arg(long, value_name = "LIST")]
    media: Option<String>,

    /// Show optimal posting windows instead of scheduling
    #[arg(long)]
    suggest_time: bool,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Reference instant used instead of the clock
    #[arg(long, hide = true)]
    now: Option<String>,
}

fn main() {
    let cli = parse_cli();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Parse arguments; usage errors exit 1, help and version exit 0
fn parse_cli() -> Cli {
    Cli::try_parse().unwrap_or_else(|e| {
        let code = match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        };
        let _ = e.print();
        std::process::exit(code);
    })
}

fn run(cli: Cli) -> Result<()> {
    let logging = LoggingSettings::load()?;
    LoggingConfig::resolve(&logging, cli.verbose).init();

    if cli.platforms.is_none() && !cli.suggest_time {
        println!("{}", Cli::command().render_long_help());
        return Ok(());
    }

    let format: OutputFormat = cli.format.parse()?;
    let now = reference_time(cli.now.as_deref())?;
    let service = CastwiseService::new();

    if cli.suggest_time {
        return cmd_suggest(&service, cli.platforms.as_deref(), now, format);
    }

    let content = cli
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| CastwiseError::InvalidInput("--content is required".to_string()))?;

    let request = ScheduleRequest {
        platforms: cli
            .platforms
            .as_deref()
            .map(split_platform_list)
            .unwrap_or_default(),
        content,
        time: cli.time,
        media: cli.media.as_deref().map(split_media_list).unwrap_or_default(),
    };

    let post = service.scheduling().schedule(&request, now)?;
    tracing::debug!(post_id = %post.id, "Built scheduled post");

    match format {
        OutputFormat::Text => {
            println!("{}", format_post(&post));
            println!();
            println!("{}", PREVIEW_NOTE);
        }
        OutputFormat::Json => println!("{:#}", post_json(&post)),
    }

    Ok(())
}

/// Print optimal windows; every platform when none are named
fn cmd_suggest(
    service: &CastwiseService,
    platforms: Option<&str>,
    now: DateTime<Utc>,
    format: OutputFormat,
) -> Result<()> {
    let names = match platforms.map(split_platform_list) {
        Some(names) if !names.is_empty() => names,
        _ => PlatformKey::ALL.iter().map(|p| p.as_str().to_string()).collect(),
    };

    let suggestions = service.scheduling().suggest(&names, now);

    match format {
        OutputFormat::Text => println!("{}", format_suggestions(&suggestions)),
        OutputFormat::Json => println!("{:#}", suggestions_json(&suggestions)),
    }

    Ok(())
}

fn reference_time(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(raw) => Ok(parse_timestamp(raw)?),
        None => Ok(Utc::now()),
    }
}
