// gsheet - headless sheet render/apply round trips
//
// Logging goes to stderr; stdout carries only the command output.

mod exit_codes;
mod sheet_ops;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use exit_codes::{EXIT_CONFIG, EXIT_DATA, EXIT_ERROR, EXIT_IO, EXIT_SHEET, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "gsheet")]
#[command(about = "Render a sheet and apply client edit requests (headless)")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the widget init script for a sheet
    #[command(after_help = "\
Examples:
  gsheet render --config orders.toml --data orders.json
  gsheet render --config orders.toml --data orders.json --json")]
    Render {
        /// Sheet definition (TOML)
        #[arg(long, short = 'c')]
        config: PathBuf,

        /// Rows (JSON array of objects)
        #[arg(long, short = 'd')]
        data: PathBuf,

        /// Print the widget config as JSON instead of the script
        #[arg(long)]
        json: bool,
    },

    /// Run one client request through decode, validate and update-model
    #[command(after_help = "\
Examples:
  gsheet apply -c orders.toml -d orders.json --request edit.json --partial
  gsheet apply -c orders.toml -d orders.json --request edit.json --write --save-state state.json
  gsheet apply -c orders.toml -d orders.json --request edit.json --state state.json --strict")]
    Apply {
        /// Sheet definition (TOML)
        #[arg(long, short = 'c')]
        config: PathBuf,

        /// Rows (JSON array of objects)
        #[arg(long, short = 'd')]
        data: PathBuf,

        /// Request parameters (JSON object of name -> value)
        #[arg(long, short = 'r')]
        request: PathBuf,

        /// Sheet state from a previous request; ignored if the file is missing
        #[arg(long)]
        state: Option<PathBuf>,

        /// Treat the request as a partial (AJAX) update
        #[arg(long)]
        partial: bool,

        /// Rewrite the data file with committed rows
        #[arg(long)]
        write: bool,

        /// Write the sheet state after the request
        #[arg(long, value_name = "PATH")]
        save_state: Option<PathBuf>,

        /// Exit with code 7 if the request had bad updates
        #[arg(long)]
        strict: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Render { config, data, json } => sheet_ops::cmd_render(&config, &data, json),
        Commands::Apply {
            config,
            data,
            request,
            state,
            partial,
            write,
            save_state,
            strict,
        } => sheet_ops::cmd_apply(sheet_ops::ApplyArgs {
            config,
            data,
            request,
            state,
            partial,
            write,
            save_state,
            strict,
        }),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self { code: EXIT_DATA, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<gridsheet_config::ConfigError> for CliError {
    fn from(e: gridsheet_config::ConfigError) -> Self {
        let code = match e {
            gridsheet_config::ConfigError::Io { .. } => EXIT_IO,
            _ => EXIT_CONFIG,
        };
        Self { code, message: e.to_string(), hint: None }
    }
}

impl From<gridsheet_engine::SheetError> for CliError {
    fn from(e: gridsheet_engine::SheetError) -> Self {
        let hint = match e {
            gridsheet_engine::SheetError::MissingRowKey => Some("set `row_key` in the [sheet] table".to_string()),
            gridsheet_engine::SheetError::InvalidColumnIndex(_) | gridsheet_engine::SheetError::ColumnOutOfRange(_) => {
                Some("the request was built against a different column layout; pass --state".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_SHEET, message: e.to_string(), hint }
    }
}
