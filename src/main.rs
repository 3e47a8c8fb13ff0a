use anyhow::Result;
use clap::{Parser, Subcommand};

use langsense::cli::{self, HistoryArgs, OutputFormat};
use langsense::{config, logging};

#[derive(Debug, Parser)]
#[command(name = "langsense")]
#[command(about = "Dashboard client for the LangSense language-detection service")]
struct App {
    /// Service origin, e.g. http://127.0.0.1:8000 (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect the language of a text (English, Hindi or Hinglish)
    Detect {
        /// The text to classify
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        text: Vec<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Browse detection history
    History {
        /// Page to show
        #[arg(long)]
        page: Option<u32>,
        /// Records per page (1-100)
        #[arg(long)]
        per_page: Option<u32>,
        /// Only show this language: English, Hindi, Hinglish, Unknown
        #[arg(long)]
        language: Option<String>,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        /// Page through results with n/p/r/f/q commands
        #[arg(long, short)]
        interactive: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show detection statistics
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Run the server's built-in detection test cases
    SelfTest {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write ~/.langsense/config.toml with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let app = App::parse();

    let (mut cfg, config_warnings) = config::load_with_warnings();
    if let Some(url) = app.api_url {
        cfg.api.base_url = url;
    }
    logging::init(&cfg.logging.level)?;
    for warning in &config_warnings {
        tracing::warn!("{warning}");
    }

    match app.command {
        Commands::Detect { text, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_detect(&cfg, &text.join(" "), fmt)
        }
        Commands::History {
            page,
            per_page,
            language,
            search,
            interactive,
            format,
        } => {
            if let Some(n) = per_page {
                cfg.history.per_page = n;
            }
            let args = HistoryArgs {
                page,
                language,
                search,
                interactive,
            };
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&cfg, &args, fmt)
        }
        Commands::Stats { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(&cfg, fmt)
        }
        Commands::SelfTest { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_self_test(&cfg, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
        },
    }
}
