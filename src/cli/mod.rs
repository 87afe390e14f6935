//! CLI module for Musafir
//!
//! Provides subcommands:
//! - `serve`: HTTP API server
//! - `ask`: answer a single question and print the result as JSON

pub mod ask;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Musafir - travel questions answered from city guides
#[derive(Parser)]
#[command(name = "musafir")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Answer one question and print the graded result
    Ask(ask::AskArgs),
}

/// Load `.env` and layered configuration, then start logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["musafir", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "musafir",
            "ask",
            "--city",
            "Cairo",
            "--model",
            "ministral-8b-latest",
            "--strategy",
            "hybrid_fusion",
            "Where can I eat koshary?",
        ])
        .unwrap();

        let Command::Ask(args) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(args.question, "Where can I eat koshary?");
        assert_eq!(args.city.as_deref(), Some("Cairo"));
        assert_eq!(args.model, "ministral-8b-latest");
        assert_eq!(args.strategy.as_deref(), Some("hybrid_fusion"));
        assert!(!args.record);
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["musafir", "ask"]).is_err());
    }
}
