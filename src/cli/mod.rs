//! CLI command implementations for langsense.
//!
//! Provides subcommand handlers for:
//! - `langsense detect "text"` — classify a text
//! - `langsense history` — browse detection history, optionally interactively
//! - `langsense stats` — aggregate statistics and charts
//! - `langsense self-test` — run the server's predefined detection cases
//! - `langsense config show|init` — configuration management

pub mod terminal;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

use crate::api::{ApiClient, UreqTransport};
use crate::config::{self, LangsenseConfig};
use crate::dashboard::{Dashboard, FilterState, ReloadOutcome};
use crate::error::DashboardError;

pub use terminal::TerminalRenderer;

/// Output format for dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

type TerminalDashboard = Dashboard<UreqTransport, TerminalRenderer>;

fn dashboard(config: &LangsenseConfig, format: OutputFormat) -> TerminalDashboard {
    let client = ApiClient::new(UreqTransport::from_config(&config.api));
    Dashboard::new(client, TerminalRenderer::new(format), config)
}

// ---------------------------------------------------------------------------
// langsense detect
// ---------------------------------------------------------------------------

/// Submit text for detection and show the result.
pub fn run_detect(config: &LangsenseConfig, text: &str, format: OutputFormat) -> Result<()> {
    dashboard(config, format).detect(text)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// langsense history
// ---------------------------------------------------------------------------

/// Options of `langsense history`.
#[derive(Debug, Clone, Default)]
pub struct HistoryArgs {
    pub page: Option<u32>,
    pub language: Option<String>,
    pub search: Option<String>,
    pub interactive: bool,
}

/// Show one history page, or browse pages interactively.
pub fn run_history(config: &LangsenseConfig, args: &HistoryArgs, format: OutputFormat) -> Result<()> {
    let mut dash = dashboard(config, format);

    let filters = FilterState::from_inputs(
        args.language.as_deref().unwrap_or(""),
        args.search.as_deref().unwrap_or(""),
    )?;
    dash.apply_filters_at(filters, args.page.unwrap_or(1))?;

    if args.interactive {
        browse(&mut dash)?;
    }

    Ok(())
}

/// A command typed at the interactive history prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    Reload,
    Filter(FilterState),
    Quit,
    Help,
}

impl BrowseCommand {
    /// Parse one input line. `f [LANG] [SEARCH...]` sets filters; `f` alone
    /// clears them. Unknown commands and language labels are validation errors.
    pub fn parse(line: &str) -> Result<Self, DashboardError> {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match head.to_ascii_lowercase().as_str() {
            "n" | "next" => Ok(Self::Next),
            "p" | "prev" => Ok(Self::Prev),
            "r" | "reload" => Ok(Self::Reload),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            "h" | "help" | "?" => Ok(Self::Help),
            "f" | "filter" => {
                let rest = rest.trim();
                let (language, search) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                FilterState::from_inputs(language, search).map(Self::Filter)
            }
            _ => Err(DashboardError::Validation(format!("unknown command: {line}"))),
        }
    }
}

fn browse(dash: &mut TerminalDashboard) -> Result<()> {
    print_browse_help();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", "history>".bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match BrowseCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.user_message().yellow());
                continue;
            }
        };

        // Errors are already rendered; keep the session alive.
        let outcome = match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                print_browse_help();
                continue;
            }
            BrowseCommand::Next => dash.next_page(),
            BrowseCommand::Prev => dash.prev_page(),
            BrowseCommand::Reload => dash.reload(),
            BrowseCommand::Filter(filters) => dash.apply_filters(filters),
        };

        if let Ok(ReloadOutcome::Ignored) = outcome {
            println!("{}", "Nothing to do there.".dimmed());
        }
    }

    Ok(())
}

fn print_browse_help() {
    println!(
        "{}",
        "n next · p prev · r reload · f [LANG] [SEARCH] filter · q quit".dimmed()
    );
}

// ---------------------------------------------------------------------------
// langsense stats / self-test
// ---------------------------------------------------------------------------

/// Show aggregate statistics.
pub fn run_stats(config: &LangsenseConfig, format: OutputFormat) -> Result<()> {
    dashboard(config, format).load_statistics()?;
    Ok(())
}

/// Run the server's predefined detection cases.
pub fn run_self_test(config: &LangsenseConfig, format: OutputFormat) -> Result<()> {
    dashboard(config, format).self_test()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// langsense config
// ---------------------------------------------------------------------------

/// `langsense config show`.
pub fn run_config_show() -> Result<()> {
    if let Some(path) = config::global_config_file() {
        let status = if path.exists() { "found" } else { "not found" };
        println!("{}", format!("# {} ({status})", path.display()).dimmed());
    }
    println!("{}", config::show_effective_config()?);
    Ok(())
}

/// `langsense config init [--force]`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::api::types::Language;

    use super::*;

    #[test]
    fn output_format_defaults_to_table() {
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str_opt(Some("xml")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
    }

    #[test]
    fn browse_command_parses_navigation() {
        assert_eq!(BrowseCommand::parse("n"), Ok(BrowseCommand::Next));
        assert_eq!(BrowseCommand::parse(" PREV "), Ok(BrowseCommand::Prev));
        assert_eq!(BrowseCommand::parse("r"), Ok(BrowseCommand::Reload));
        assert_eq!(BrowseCommand::parse("q"), Ok(BrowseCommand::Quit));
        assert!(matches!(
            BrowseCommand::parse("jump 4"),
            Err(DashboardError::Validation(_))
        ));
    }

    #[test]
    fn browse_command_parses_filters() {
        let Ok(BrowseCommand::Filter(filters)) = BrowseCommand::parse("f hinglish office ja") else {
            panic!("expected filter command");
        };
        assert_eq!(filters.language, Some(Language::Hinglish));
        assert_eq!(filters.search.as_deref(), Some("office ja"));

        assert_eq!(
            BrowseCommand::parse("f"),
            Ok(BrowseCommand::Filter(FilterState::default()))
        );
        let Ok(BrowseCommand::Filter(filters)) = BrowseCommand::parse("f all namaste") else {
            panic!("expected filter command");
        };
        assert_eq!(filters.language, None);
        assert_eq!(filters.search.as_deref(), Some("namaste"));
    }

    #[test]
    fn browse_filter_rejects_mistyped_language() {
        let err = BrowseCommand::parse("f hindu chai").unwrap_err();
        assert!(matches!(err, DashboardError::Validation(ref msg) if msg.contains("hindu")));
    }
}
