use clap::{CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Surplus-food listing store: rebuild from CSV sources and query the result
#[derive(Parser, Debug, Clone)]
#[command(
    name = "foodshare",
    about = "Surplus-food listing store: rebuild from CSV sources and query the result",
    version
)]
pub struct Settings {
    /// Directory holding the four CSV sources
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// SQLite store location
    #[arg(long, global = true, default_value = "foodwaste.db")]
    pub db_path: PathBuf,

    /// Schema file overriding the bundled one
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Named-query library overriding the bundled one
    #[arg(long, global = true)]
    pub queries: Option<PathBuf>,

    /// Timezone used to decide "today" ("auto" for the system zone)
    #[arg(long, global = true, default_value = "UTC")]
    pub timezone: String,

    /// Fail instead of synthesizing fixture CSVs for missing sources
    #[arg(long, global = true)]
    pub no_fixture: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long, global = true)]
    pub clear: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Operations exposed on the command line.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rebuild the store from the CSV sources
    Rebuild,
    /// Report whether the store exists and its row counts
    Status,
    /// List food listings, optionally filtered (comma-separated values)
    Listings {
        #[arg(long, value_delimiter = ',')]
        city: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        provider_type: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        food_type: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        meal_type: Vec<String>,
    },
    /// Listings expiring between today and today + N days
    Expiring {
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(0..=365))]
        days: u32,
    },
    /// Headline counts and claim breakdowns
    Stats,
    /// Distinct values available for each listing filter
    Options,
    /// Run the named analytical query library
    Insights {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        days: Option<u32>,
    },
    /// Run a read statement with positional parameters
    Query {
        sql: String,
        #[arg(allow_hyphen_values = true)]
        params: Vec<String>,
    },
    /// Run a write statement with positional parameters
    Execute {
        sql: String,
        #[arg(allow_hyphen_values = true)]
        params: Vec<String>,
    },
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.foodshare/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".foodshare").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "data_dir") {
            if let Some(v) = last.data_dir {
                settings.data_dir = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "db_path") {
            if let Some(v) = last.db_path {
                settings.db_path = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// The subcommand to run; `status` when none was given.
    pub fn subcommand(&self) -> Command {
        self.command.clone().unwrap_or(Command::Status)
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_dir: Some(s.data_dir.clone()),
            db_path: Some(s.db_path.clone()),
            timezone: Some(s.timezone.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
