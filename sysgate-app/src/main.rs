use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use std::io::{IsTerminal, Read};
use std::process::ExitCode;
use std::sync::Arc;
use sysgate_app::cli::{Cli, Commands, OutputFormat};
use sysgate_app::render::{self, Renderer};
use sysgate_app::repl::Repl;
use sysgate_app::server;
use sysgate_core::{AgentTranslation, ApiResponse, FreeFormRequest, Gateway, GatewayConfig};
use sysgate_interpreter::StructuredResult;
use tracing::info;
use tracing_subscriber::EnvFilter;

const EXIT_ERROR: u8 = 1;
const EXIT_BLOCKED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = GatewayConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let gateway = Gateway::from_config(config);
    let renderer = Renderer::new(std::io::stdout().is_terminal());
    let format = cli.format;

    match cli.command {
        Commands::Metric { name } => match gateway.run_metric(&name).await {
            Ok(report) => {
                match format {
                    OutputFormat::Text => print!("{}", renderer.metric(&report)),
                    OutputFormat::Json => print_json(&report)?,
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => fail(format, ApiResponse::from_error(&e)),
        },
        Commands::Catalog => {
            match format {
                OutputFormat::Text => print!("{}", render::catalog(gateway.catalog().entries())),
                OutputFormat::Json => print_json(&gateway.catalog().entries().collect::<Vec<_>>())?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Policy => {
            let policy = gateway.policy();
            match format {
                OutputFormat::Text => {
                    println!("Denied patterns:");
                    for pattern in policy.deny_patterns() {
                        println!("  {:?}", pattern);
                    }
                    println!("Allowed prefixes:");
                    for prefix in policy.allow_prefixes() {
                        println!("  {:?}", prefix);
                    }
                }
                OutputFormat::Json => print_json(&json!({
                    "deny_patterns": policy.deny_patterns(),
                    "allow_prefixes": policy.allow_prefixes(),
                }))?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { command } => {
            let decision = gateway.check(&command);
            match format {
                OutputFormat::Text => match decision.reason() {
                    None => println!("allowed: {}", command),
                    Some(reason) => println!("denied: {}", reason),
                },
                OutputFormat::Json => print_json(&decision)?,
            }
            Ok(if decision.is_allowed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_BLOCKED)
            })
        }
        Commands::Exec {
            command,
            columns,
            shape,
        } => {
            let mut request = FreeFormRequest::new(command.as_str(), command.as_str())
                .with_columns(columns);
            request.shape_hint = shape;
            match gateway.run_free_form(request).await {
                Ok(result) => deliver(format, &renderer, &result),
                Err(e) => fail(format, ApiResponse::from_error(&e)),
            }
        }
        Commands::Agent { file, query } => {
            let raw = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read agent envelope from stdin")?;
                    buffer
                }
            };
            let envelope: Value =
                serde_json::from_str(&raw).context("Agent envelope is not valid JSON")?;
            let translation = AgentTranslation::extract(&query, &envelope);
            info!("Agent proposed: {}", translation.command);
            match gateway.run_translation(translation).await {
                Ok(result) => deliver(format, &renderer, &result),
                Err(e) => fail(format, ApiResponse::from_error(&e)),
            }
        }
        Commands::Serve { bind } => {
            server::serve(Arc::new(gateway), &bind).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Repl => {
            Repl::new(&gateway, renderer).run().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn deliver(format: OutputFormat, renderer: &Renderer, result: &StructuredResult) -> Result<ExitCode> {
    match format {
        OutputFormat::Text => print!("{}", renderer.result(result)),
        OutputFormat::Json => print_json(result)?,
    }
    Ok(if result.is_blocked() {
        ExitCode::from(EXIT_BLOCKED)
    } else {
        ExitCode::SUCCESS
    })
}

fn fail(format: OutputFormat, response: ApiResponse) -> Result<ExitCode> {
    match (&response, format) {
        (_, OutputFormat::Json) => print_json(&response)?,
        (ApiResponse::Failure { error, stderr, .. }, OutputFormat::Text) => {
            eprintln!("error: {}", error);
            if let Some(stderr) = stderr.as_deref().filter(|s| !s.is_empty()) {
                eprintln!("{}", stderr);
            }
        }
        (_, OutputFormat::Text) => {}
    }
    Ok(ExitCode::from(EXIT_ERROR))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
