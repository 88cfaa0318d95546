use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use sysgate_interpreter::ResultShape;

#[derive(Parser, Debug)]
#[command(name = "sysgate")]
#[command(version, about = "Read-only system inspection gateway")]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "SYSGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a catalog metric by name
    Metric { name: String },

    /// List catalog metrics
    Catalog,

    /// Show the active deny patterns and allowed prefixes
    Policy,

    /// Evaluate a command against the policy without running it
    Check { command: String },

    /// Validate, run and interpret a free-form command
    Exec {
        command: String,
        /// Expected column names, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// table, progress_bar, key_value or text; inferred when omitted
        #[arg(long)]
        shape: Option<ResultShape>,
    },

    /// Run the command found in a translation agent response
    Agent {
        /// Envelope file; stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
        /// The operator's original question
        #[arg(long, default_value = "")]
        query: String,
    },

    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: String,
    },

    /// Interactive session with in-memory history
    Repl,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_with_columns_and_shape() {
        let cli = Cli::try_parse_from([
            "sysgate",
            "--format",
            "json",
            "exec",
            "free",
            "--columns",
            "total,used,free",
            "--shape",
            "table",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Exec {
                command,
                columns,
                shape,
            } => {
                assert_eq!(command, "free");
                assert_eq!(columns, vec!["total", "used", "free"]);
                assert_eq!(shape, Some(ResultShape::Table));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_shape_rejected() {
        assert!(Cli::try_parse_from(["sysgate", "exec", "free", "--shape", "chart"]).is_err());
    }

    #[test]
    fn test_serve_default_bind() {
        let cli = Cli::try_parse_from(["sysgate", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { ref bind } if bind == "127.0.0.1:3000"));
    }
}
