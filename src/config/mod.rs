/// Configuration system for langsense.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — [`schema::LangsenseConfig::default()`]
/// 2. **User global config** — `~/.langsense/config.toml`
/// 3. **Project local config** — `.langsense.toml` in the current directory
/// 4. **Environment variables** — `LANGSENSE_*` overrides (highest precedence)
///
/// Each TOML file is overlaid key by key on the layers below it, so a project
/// file only needs the keys it changes. Malformed files are ignored so a bad
/// config never stops the dashboard from starting.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::{ApiConfig, HistoryConfig, LangsenseConfig, LoggingConfig, StatisticsConfig};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration, logging problems with config files.
pub fn load() -> LangsenseConfig {
    let (config, warnings) = load_with_warnings();
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    config
}

/// Load the fully resolved configuration and hand back problems with config
/// files instead of logging them, for use before logging is initialized.
pub fn load_with_warnings() -> (LangsenseConfig, Vec<String>) {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .flatten()
        .filter_map(|path| {
            let content = fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        });

    let (mut config, warnings) = resolve_layers(layers);
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    (config, warnings)
}

/// Overlay `(source, toml)` layers key by key over the defaults; later layers
/// win. A layer that is not valid TOML or does not fit the schema is skipped.
fn resolve_layers<I>(layers: I) -> (LangsenseConfig, Vec<String>)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged = toml::Table::new();
    let mut warnings = Vec::new();

    for (source, content) in layers {
        let table = match toml::from_str::<toml::Table>(&content) {
            Ok(table) => table,
            Err(e) => {
                warnings.push(format!("ignoring malformed config file {source}: {e}"));
                continue;
            }
        };
        if let Err(e) = toml::Value::Table(table.clone()).try_into::<LangsenseConfig>() {
            warnings.push(format!("ignoring malformed config file {source}: {e}"));
            continue;
        }
        merge_tables(&mut merged, table);
    }

    let config = toml::Value::Table(merged)
        .try_into::<LangsenseConfig>()
        .unwrap_or_else(|e| {
            warnings.push(format!("falling back to default config: {e}"));
            LangsenseConfig::default()
        });
    (config, warnings)
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".langsense").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".langsense.toml"))
}

/// Path of the global config file, for display and `config init`.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment overrides read through `lookup`.
///
/// Supported variables:
/// - `LANGSENSE_API_URL` — service origin
/// - `LANGSENSE_TIMEOUT_MS` — request timeout (`0` disables)
/// - `LANGSENSE_PER_PAGE` — history page size
/// - `LANGSENSE_LOG` — logging filter
pub fn apply_env_overrides<F>(config: &mut LangsenseConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("LANGSENSE_API_URL")
        && !val.trim().is_empty()
    {
        config.api.base_url = val.trim().to_string();
    }
    if let Some(val) = lookup("LANGSENSE_TIMEOUT_MS")
        && let Ok(ms) = val.trim().parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = lookup("LANGSENSE_PER_PAGE")
        && let Ok(n) = val.trim().parse::<u32>()
    {
        config.history.per_page = n;
    }
    if let Some(val) = lookup("LANGSENSE_LOG")
        && !val.trim().is_empty()
    {
        config.logging.level = val.trim().to_string();
    }
}

// ---------------------------------------------------------------------------
// Config init / show
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.langsense/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.langsense/ directory")?;
    }

    fs::write(&path, LangsenseConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
