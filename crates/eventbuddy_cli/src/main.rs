//! CLI entry point for local inspection of an EventBuddy store.
//!
//! # Responsibility
//! - Open (or seed) a SQLite-backed store and start a session.
//! - Print events admitted by an optional filter.
//!
//! Usage: `eventbuddy_cli [db_path] [status] [tag_id] [participant_id] [text]`
//!
//! Environment:
//! - `EVENTBUDDY_LOG_DIR`: absolute directory for rolling log files.
//! - `EVENTBUDDY_LOG_LEVEL`: log level, defaults to the build profile level.
//! - `EVENTBUDDY_USER_NAME` / `EVENTBUDDY_USER_EMAIL`: organizer identity used
//!   when none is persisted.

use eventbuddy_core::{
    default_log_level, init_logging, FilterPredicate, Identity, Session, SqliteKvStore,
    StaticIdentity, StoreOptions,
};
use std::process::ExitCode;

const DEFAULT_DB_PATH: &str = "eventbuddy.db";
const DEFAULT_USER_NAME: &str = "Organizer";
const DEFAULT_USER_EMAIL: &str = "organizer@example.com";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("eventbuddy: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    if let Ok(log_dir) = std::env::var("EVENTBUDDY_LOG_DIR") {
        let level = std::env::var("EVENTBUDDY_LOG_LEVEL")
            .unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let arg = |index: usize, fallback: &'static str| -> String {
        args.get(index).cloned().unwrap_or_else(|| fallback.to_string())
    };

    let kv = SqliteKvStore::open(arg(0, DEFAULT_DB_PATH)).map_err(|err| err.to_string())?;
    let mut identity = StaticIdentity(Identity::new(
        env_or("EVENTBUDDY_USER_NAME", DEFAULT_USER_NAME),
        env_or("EVENTBUDDY_USER_EMAIL", DEFAULT_USER_EMAIL),
    ));
    let mut session = Session::start(kv, &mut identity, StoreOptions::default())
        .map_err(|err| err.to_string())?;
    log::info!("event=cli_start module=cli status=ok");

    session.set_filter(FilterPredicate::from_form(
        &arg(1, "all"),
        &arg(2, "all"),
        &arg(3, "all"),
        &arg(4, ""),
    ));

    if let Some(user) = session.store().current_user() {
        println!("organizer: {}", user.signature());
    }
    let tags = session.store().tags().to_vec();
    for event in session.visible_events() {
        let tag_names = event
            .tag_ids
            .iter()
            .filter_map(|id| tags.iter().find(|tag| tag.id == *id))
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:>14}  {}  [{}]  {} @ {}  ({} invited)  {}",
            event.id,
            event.formatted_datetime(),
            event.status,
            event.title,
            event.location,
            event.participant_ids.len(),
            tag_names
        );
    }
    Ok(())
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
