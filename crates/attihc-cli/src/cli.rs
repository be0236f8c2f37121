//! Command line definition.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};

use attihc_core::{DayField, Feature, Theme};

#[derive(Debug, Parser)]
#[command(name = "attihc", version, about = "Remember, complete, avoid: one day at a time")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show today's entry and the current streak
    Today,

    /// Set one field of today's entry
    Set {
        /// remember, complete, avoid, focus or scratch
        field: DayField,
        /// New text (words are joined with spaces; empty clears the field)
        #[arg(num_args = 0.., trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// List past entries, newest first
    History {
        /// Only entries containing this text
        #[arg(short, long)]
        search: Option<String>,
        /// Only entries with a focus word
        #[arg(long)]
        focus: bool,
        /// Only entries with scratchpad notes
        #[arg(long)]
        scratch: bool,
        /// Only favorites
        #[arg(long)]
        favorites: bool,
    },

    /// Toggle the favorite mark on a day (YYYY-MM-DD)
    Favorite { date: String },

    /// Show the current streak
    Streak,

    /// Show aggregate statistics
    Insights {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write all entries as JSON
    Export {
        /// File to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all entries with a JSON backup
    Import { path: PathBuf },

    /// Delete every entry
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print current settings
    Show,

    /// Hour (0-23) at which a new day starts
    ResetHour { hour: u8 },

    /// light, dark or system
    Theme { theme: Theme },

    /// Suppress hints and animation
    Quiet {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        on: bool,
    },

    /// Turn an optional widget on or off
    Feature {
        /// focus-timer, quick-notes, daily-inspiration, water-tracker,
        /// priority-matrix or quick-actions
        feature: Feature,
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        on: bool,
    },
}
