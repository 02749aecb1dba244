//! cast-validate - Check post content against platform limits
//!
//! Exits 0 when the content is valid for the platform, 1 otherwise.

use clap::error::ErrorKind;
use clap::Parser;
use libcastwise::config::LoggingSettings;
use libcastwise::logging::LoggingConfig;
use libcastwise::report::{OutputFormat, ValidationReport};
use libcastwise::types::split_media_list;
use libcastwise::{CastwiseService, Result};

#[derive(Parser, Debug)]
#[command(name = "cast-validate")]
#[command(version)]
#[command(about = "Check post content against platform limits")]
#[command(long_about = "\
cast-validate - Check post content against platform limits

DESCRIPTION:
    cast-validate checks content length, media count, media types and
    required media for one platform. Errors make the content invalid;
    warnings (near the length limit, mention format, suppressed links) do not.

USAGE EXAMPLES:
    # Validate a short post for x
    cast-validate --platform x --content \"Hello world\"

    # Validate a video post
    cast-validate --platform youtube --content \"Demo\" --media demo.mp4

    # Use the extended length limit of a premium account
    cast-validate --platform x --content \"$(cat thread.txt)\" --premium

    # Machine-readable output
    cast-validate --platform linkedin --content \"Hi\" --format json

SUPPORTED PLATFORMS:
    x, linkedin, facebook, threads, tiktok, youtube

EXIT CODES:
    0 - Content is valid
    1 - Content is invalid, or input was missing or malformed
")]
struct Cli {
    /// Target platform
    #[arg(long)]
    platform: Option<String>,

    /// Content to validate
    #[arg(long)]
    content: Option<String>,

    /// Comma-separated media files or URLs
    #[arg(long, value_name = "LIST")]
    media: Option<String>,

    /// Use the premium length limit where the platform has one
    #[arg(long)]
    premium: bool,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = parse_cli();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
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

/// Returns whether the content was valid
fn run(cli: Cli) -> Result<bool> {
    let logging = LoggingSettings::load()?;
    LoggingConfig::resolve(&logging, cli.verbose).init();

    let format: OutputFormat = cli.format.parse()?;
    let service = CastwiseService::new();

    let (platform, content) = match (cli.platform, cli.content) {
        (Some(platform), Some(content)) => (platform.trim().to_lowercase(), content),
        _ => {
            eprintln!("{}", usage(&service));
            return Ok(false);
        }
    };

    let media = cli.media.as_deref().map(split_media_list).unwrap_or_default();

    let result = service
        .validation()
        .validate(&platform, &content, &media, cli.premium);

    tracing::debug!(
        platform = %platform,
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        "Validated content"
    );

    let report = ValidationReport {
        platform: &platform,
        content: &content,
        media: &media,
        result: &result,
    };

    match format {
        OutputFormat::Text => println!("{}", report.to_text()),
        OutputFormat::Json => println!("{:#}", report.to_json()),
    }

    Ok(result.is_valid())
}

fn usage(service: &CastwiseService) -> String {
    format!(
        "Usage: cast-validate --platform <PLATFORM> --content <TEXT> [--media <LIST>] [--premium]\n\n\
         Supported platforms: {}",
        service.rules().supported_list()
    )
}
