//! attihc - plan your day from the terminal.
//!
//! A thin front end over `attihc-core`: every subcommand opens the
//! file-backed store, runs one operation, and flushes before exit.

mod cli;
mod output;

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use attihc_core::{
    Config, DayPatch, FileBackend, HistoryFilter, LocalStore, Store, StoreOptions,
};

use attihc_core::store::HEAT_SPAN_DAYS;
use cli::{Cli, Command, SettingsCommand};

/// Initialize the tracing subscriber for logging.
///
/// Returns the file writer guard when file logging is on; it must live
/// until exit so buffered lines are written.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_dir() {
        Ok(dir) if config.log_to_file => {
            let appender = tracing_appender::rolling::daily(dir, "attihc.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn open_store(config: &Config) -> Result<Store> {
    let data_dir = config.data_dir()?;
    debug!(?data_dir, "Data directory configured");

    let backend = FileBackend::new(data_dir.clone())
        .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;

    let options = StoreOptions {
        debounce: config.debounce(),
        ..StoreOptions::default()
    };
    Ok(Store::new(LocalStore::new(Arc::new(backend)), options))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {:#}, using defaults", e);
            Config::default()
        }
    }
    .with_env();

    let _guard = init_tracing(&config);
    info!("attihc starting");

    let store = open_store(&config)?;
    let result = run(&store, cli.command);

    if store.flush() {
        debug!("Flushed pending edits before exit");
    }
    result
}

fn run(store: &Store, command: Command) -> Result<()> {
    match command {
        Command::Today => {
            let today = store.today();
            match store.today_entry() {
                Some(entry) => print!("{}", output::entry(&entry)),
                None => println!("{}  (nothing yet)", today),
            }
            println!("Streak: {}", output::streak(store.streak()));
        }

        Command::Set { field, text } => {
            let text = text.join(" ");
            let entry = store.update_today(DayPatch::text(field, text));
            print!("{}", output::entry(&entry));
        }

        Command::History {
            search,
            focus,
            scratch,
            favorites,
        } => {
            let filter = HistoryFilter {
                query: search.unwrap_or_default(),
                has_focus: focus,
                has_scratch: scratch,
                favorites_only: favorites,
            };
            let entries = store.filtered_history(&filter);
            println!("{}", output::heat(&store.heat(HEAT_SPAN_DAYS)));
            println!("{} entries found", entries.len());
            for entry in &entries {
                println!();
                print!("{}", output::entry(entry));
            }
        }

        Command::Favorite { date } => match store.toggle_favorite(&date) {
            Some(true) => println!("{} marked as favorite", date),
            Some(false) => println!("{} is no longer a favorite", date),
            None => bail!("No entry for {}", date),
        },

        Command::Streak => println!("{}", output::streak(store.streak())),

        Command::Insights { json } => {
            let insights = store.insights();
            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else {
                print!("{}", output::insights(&insights));
            }
        }

        Command::Export { output } => {
            let json = store.export_days().context("Failed to read stored entries")?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Command::Import { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let count = store
                .import_days(&raw)
                .with_context(|| format!("Could not import {}", path.display()))?;
            println!("Imported {} entries", count);
        }

        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete every entry without --yes");
            }
            store.clear_all();
            println!("All entries deleted");
        }

        Command::Settings { command } => run_settings(store, command)?,
    }
    Ok(())
}

fn run_settings(store: &Store, command: SettingsCommand) -> Result<()> {
    let settings = match command {
        SettingsCommand::Show => store.settings(),
        SettingsCommand::ResetHour { hour } => {
            if hour > 23 {
                bail!("Reset hour must be between 0 and 23");
            }
            store.set_reset_hour(hour)
        }
        SettingsCommand::Theme { theme } => store.set_theme(theme),
        SettingsCommand::Quiet { on } => store.set_quiet(on),
        SettingsCommand::Feature { feature, on } => store.set_feature(feature, on),
    };

    print!(
        "{}",
        output::settings(&settings, store.resolved_appearance())
    );
    Ok(())
}
