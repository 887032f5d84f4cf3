//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// apidash - four public APIs, one dashboard
///
/// Fetches a superhero, NASA's picture of the day, a GIF and a movie at the
/// same time and renders them as cards. A source that fails only blanks its
/// own card.
///
/// Examples:
///   apidash random
///   apidash themed batman --format json
///   apidash movies now-playing
///   apidash space --date 2024-04-08
///   apidash --giphy-key KEY check
///   apidash init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .apidash.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Write output to FILE instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Superhero API key
    #[arg(long, value_name = "KEY", env = "APIDASH_SUPERHERO_KEY", global = true, hide_env_values = true)]
    pub superhero_key: Option<String>,

    /// NASA API key (defaults to NASA's public DEMO_KEY)
    #[arg(long, value_name = "KEY", env = "APIDASH_NASA_KEY", global = true, hide_env_values = true)]
    pub nasa_key: Option<String>,

    /// GIPHY API key
    #[arg(long, value_name = "KEY", env = "APIDASH_GIPHY_KEY", global = true, hide_env_values = true)]
    pub giphy_key: Option<String>,

    /// TMDB API key
    #[arg(long, value_name = "KEY", env = "APIDASH_TMDB_KEY", global = true, hide_env_values = true)]
    pub tmdb_key: Option<String>,

    /// Disable the progress spinner
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build a dashboard from random picks of every source
    Random,

    /// Build a dashboard around a search theme
    Themed {
        /// Theme to search for (e.g. space, action, batman, cats)
        theme: String,
    },

    /// Query the Superhero API
    Hero {
        #[command(subcommand)]
        action: HeroAction,
    },

    /// NASA's Astronomy Picture of the Day (today unless --date or --random)
    Space {
        /// Picture published on this day
        #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "random")]
        date: Option<NaiveDate>,

        /// A random picture from the archive
        #[arg(long)]
        random: bool,
    },

    /// Query GIPHY
    Gifs {
        #[command(subcommand)]
        action: GifAction,
    },

    /// Query TMDB
    Movies {
        #[command(subcommand)]
        action: MovieAction,
    },

    /// Test connectivity and credentials of every source
    Check,

    /// Show which API keys are configured
    Status,

    /// Generate a default .apidash.toml configuration file
    InitConfig,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HeroAction {
    /// Every character whose name matches NAME
    Search { name: String },
    /// A random character
    Random,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GifAction {
    /// Currently trending GIFs
    Trending,
    /// GIFs matching QUERY
    Search { query: String },
    /// One random GIF
    Random,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MovieAction {
    /// First page of popular movies
    Popular,
    /// Movies currently in theaters
    NowPlaying,
    /// Movies matching QUERY
    Search { query: String },
}

/// Output format for dashboards and checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }

    /// Parse the config file spelling, falling back to Markdown.
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Markdown,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Themed { theme } = &self.command {
            if theme.trim().is_empty() {
                return Err("Theme must not be empty".to_string());
            }
        }

        if let Some(term) = self.search_term() {
            if term.trim().is_empty() {
                return Err("Search query must not be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    fn search_term(&self) -> Option<&str> {
        match &self.command {
            Command::Hero {
                action: HeroAction::Search { name },
            } => Some(name),
            Command::Gifs {
                action: GifAction::Search { query },
            }
            | Command::Movies {
                action: MovieAction::Search { query },
            } => Some(query),
            _ => None,
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
