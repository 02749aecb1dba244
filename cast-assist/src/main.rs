//! cast-assist - Improve or draft marketing copy with an external assistant
//!
//! Wraps the assistant executable configured under `[assistant]`. Results are
//! printed to stdout so they can be piped into cast-validate or cast-schedule.

use std::io::Read;

use anyhow::{bail, Context};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use libcastwise::assistant::AssistantBridge;
use libcastwise::logging::LoggingConfig;
use libcastwise::{CastwiseError, Config};

#[derive(Parser, Debug)]
#[command(name = "cast-assist")]
#[command(version)]
#[command(about = "Improve or draft marketing copy with an external assistant")]
#[command(long_about = "\
cast-assist - Improve or draft marketing copy with an external assistant

DESCRIPTION:
    cast-assist runs the assistant executable non-interactively and prints
    its answer. The executable is called as:

        <command> -p --output-format json --tools Read <PROMPT>

COMMANDS:
    enhance     Rewrite content following an instruction
    generate    Draft new content from a description
    check       Report whether the assistant executable is available

USAGE EXAMPLES:
    # Tighten a post
    cast-assist enhance --instruction \"Make it punchier\" \"We shipped a thing\"

    # Enhance content from stdin and validate the result
    cat post.txt | cast-assist enhance -i \"Shorter\" | \\
        xargs -0 cast-validate --platform x --content

    # Draft a post with brand context
    cast-assist generate --type social --description \"Spring sale\" \\
        --brand '{\"voice\": \"playful\"}'

CONFIGURATION:
    Configuration file: ~/.config/castwise/config.toml

        [assistant]
        command = \"agent\"
        timeout = \"2m\"

    Override with environment variables:
        CASTWISE_CONFIG      - Path to config file
        CASTWISE_ASSISTANT   - Assistant executable

EXIT CODES:
    0 - Success (check: assistant available)
    1 - Assistant failed, timed out or gave no answer; invalid input
    2 - Assistant executable could not be started
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Assistant executable (overrides the config file)
    #[arg(long, global = true, env = "CASTWISE_ASSISTANT")]
    assistant: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite content following an instruction
    Enhance {
        /// What to change
        #[arg(short, long)]
        instruction: String,

        /// File the content came from, given to the assistant as context
        #[arg(long)]
        file: Option<String>,

        /// Content to enhance (reads from stdin if omitted)
        content: Option<String>,
    },

    /// Draft new content from a description
    Generate {
        /// Kind of content: blog, social, email, ...
        #[arg(short = 't', long = "type")]
        kind: String,

        /// What the content is about
        #[arg(short, long)]
        description: String,

        /// Brand context as a JSON object
        #[arg(long)]
        brand: Option<String>,
    },

    /// Report whether the assistant executable is available
    Check,
}

#[tokio::main]
async fn main() {
    let cli = parse_cli();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => match e.downcast_ref::<CastwiseError>() {
            Some(err) => {
                eprintln!("Error: {}", err);
                std::process::exit(err.exit_code());
            }
            None => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
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

/// Returns false when the command ran but reported a negative result
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = Config::load()?;
    LoggingConfig::resolve(&config.logging, cli.verbose).init();

    if let Some(command) = cli.assistant {
        config.assistant.command = command;
    }
    let bridge = AssistantBridge::from_config(&config.assistant)?;

    match cli.command {
        Commands::Enhance {
            instruction,
            file,
            content,
        } => cmd_enhance(&bridge, &instruction, file.as_deref(), content).await?,
        Commands::Generate {
            kind,
            description,
            brand,
        } => cmd_generate(&bridge, &kind, &description, brand.as_deref()).await?,
        Commands::Check => return Ok(cmd_check(&bridge).await),
    }

    Ok(true)
}

async fn cmd_enhance(
    bridge: &AssistantBridge,
    instruction: &str,
    file: Option<&str>,
    content: Option<String>,
) -> anyhow::Result<()> {
    let content = match content {
        Some(content) => content,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read content from stdin")?;
            buffer
        }
    };

    if content.trim().is_empty() {
        bail!(CastwiseError::InvalidInput("No content provided".to_string()));
    }
    tracing::debug!(chars = content.chars().count(), command = bridge.command(), "Enhancing content");

    let enhanced = bridge
        .enhance(&content, instruction, file)
        .await
        .map_err(CastwiseError::from)?;

    println!("{}", enhanced.trim_end());
    Ok(())
}

async fn cmd_generate(
    bridge: &AssistantBridge,
    kind: &str,
    description: &str,
    brand: Option<&str>,
) -> anyhow::Result<()> {
    let brand: Option<serde_json::Value> = brand
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| CastwiseError::InvalidInput(format!("Invalid --brand JSON: {}", e)))?;

    let drafted = bridge
        .generate(kind, description, brand.as_ref())
        .await
        .map_err(CastwiseError::from)?;

    println!("{}", drafted.trim_end());
    Ok(())
}

async fn cmd_check(bridge: &AssistantBridge) -> bool {
    let available = bridge.is_available().await;
    if available {
        println!("{}: available", bridge.command());
    } else {
        println!("{}: not available", bridge.command());
    }
    available
}
