mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use mouldnote_core::ModePreference;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mouldnote",
    version,
    about = "Extract the detail table of mould transfer notices (移模通知单)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the move date and table rows from a notice
    Parse {
        /// Path to a PDF, a positioned-page JSON file, or a plain text file
        input_file: PathBuf,

        /// Pipeline to run (PDF input only): auto, geometry or lines
        #[arg(short, long, value_enum, default_value = "auto")]
        mode: ModeArg,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the extraction result to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// JSON file overriding the extraction tolerances
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print the extraction trace to stderr
        #[arg(long)]
        trace: bool,
    },
    /// Inspect and validate extraction configs
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config as JSON
    Show {
        /// Config file to merge over the defaults
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Validate a config file
    Validate {
        /// Path to JSON config file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Geometry,
    Lines,
}

impl From<ModeArg> for ModePreference {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => ModePreference::Auto,
            ModeArg::Geometry => ModePreference::Geometry,
            ModeArg::Lines => ModePreference::Lines,
        }
    }
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input_file,
            mode,
            output,
            out,
            config,
            trace,
        } => commands::parse::run(commands::parse::ParseArgs {
            input_file,
            preference: mode.into(),
            output_format: output,
            output_file: out,
            config_file: config,
            show_trace: trace,
        }),
        Commands::Config { action } => match action {
            ConfigAction::Show { config } => commands::config::show(config.as_deref()),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
