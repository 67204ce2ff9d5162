//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for prediction and history results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Label, confidence, notes and explanation
    Full,
    /// Only the predicted label
    Label,
    /// JSON output
    Json,
}

impl From<OutputFormat> for pestwatch_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => pestwatch_domain::OutputFormat::Full,
            OutputFormat::Label => pestwatch_domain::OutputFormat::Label,
            OutputFormat::Json => pestwatch_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for pestwatch
#[derive(Parser, Debug)]
#[command(name = "pestwatch")]
#[command(author, version, about = "Identify crop pests from a photo and keep a history")]
#[command(long_about = r#"
pestwatch sends a photo of an affected plant (plus optional notes) to a pest
classification service, prints the predicted pest with its explanation, and
keeps every result in a per-device history.

Configuration files are loaded from (in priority order):
1. PESTWATCH_* environment variables (e.g. PESTWATCH_SERVICE__BASE_URL)
2. --config <path>       Explicit config file
3. ./pestwatch.toml      Project-level config
4. ~/.config/pestwatch/config.toml   Global config

Example:
  pestwatch predict leaf.jpg --text "sticky residue under the leaves"
  pestwatch history watch
  pestwatch ask "How do I get rid of aphids organically?"
"#)]
pub struct Cli {
    /// Command to run (optional with --show-config)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long, global = true)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a photo and save the result to history
    Predict {
        /// Image file (jpg, png, gif, webp, bmp)
        image: PathBuf,

        /// Symptoms or observations sent along with the image
        #[arg(short, long)]
        text: Option<String>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,

        /// Do not write the result to history
        #[arg(long)]
        no_save: bool,
    },

    /// Show or manage prediction history
    #[command(subcommand)]
    History(HistoryCommand),

    /// Ask the assistant a question about pests or plant care
    Ask {
        /// The question
        #[arg(required = true, num_args = 1.., value_name = "QUESTION")]
        question: Vec<String>,
    },

    /// Show the identity history is stored under
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Print history, newest first
    List {
        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Follow history live until interrupted
    Watch,

    /// Delete a record by id
    Delete {
        /// Record id as shown by `history list`
        id: String,
    },
}

/// The words of an `ask` command joined into one question
pub fn question_text(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict() {
        let cli = Cli::parse_from([
            "pestwatch",
            "-vv",
            "predict",
            "leaf.jpg",
            "--text",
            "holes in leaves",
            "--output",
            "json",
            "--no-save",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command.unwrap() {
            Command::Predict {
                image,
                text,
                output,
                no_save,
            } => {
                assert_eq!(image, PathBuf::from("leaf.jpg"));
                assert_eq!(text.as_deref(), Some("holes in leaves"));
                assert_eq!(output, Some(OutputFormat::Json));
                assert!(no_save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_history_delete_with_global_flag_after() {
        let cli = Cli::parse_from(["pestwatch", "history", "delete", "abc123", "--no-config"]);
        assert!(cli.no_config);
        assert!(matches!(
            cli.command,
            Some(Command::History(HistoryCommand::Delete { ref id })) if id == "abc123"
        ));
    }

    #[test]
    fn test_parse_ask_joins_words() {
        let cli = Cli::parse_from(["pestwatch", "ask", "what", "eats", "tomatoes?"]);
        match cli.command.unwrap() {
            Command::Ask { question } => {
                assert_eq!(question_text(&question), "what eats tomatoes?");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["pestwatch", "ask"]).is_err());
    }

    #[test]
    fn test_show_config_needs_no_command() {
        let cli = Cli::parse_from(["pestwatch", "--show-config"]);
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_output_format_maps_to_domain() {
        assert_eq!(
            pestwatch_domain::OutputFormat::from(OutputFormat::Label),
            pestwatch_domain::OutputFormat::Label
        );
    }
}
