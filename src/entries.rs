//! `cap entries`, `cap status` and `cap check`.

use anyhow::{bail, Result};

use capture_harness_core::models::{Entry, EntryFilter, EntryStatus, EntryType};
use capture_harness_core::store::Store;
use capture_harness_core::tracker;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Parse an entry type given on the command line or in a query string.
pub fn parse_entry_type(value: &str) -> Result<EntryType> {
    match EntryType::parse(value) {
        Some(t) => Ok(t),
        None => bail!(
            "unknown entry type '{}' (expected one of: {})",
            value,
            EntryType::ALL.map(|t| t.as_str()).join(", ")
        ),
    }
}

/// Parse an entry status given on the command line or in a request.
pub fn parse_status(value: &str) -> Result<EntryStatus> {
    match EntryStatus::parse(value) {
        Some(s) => Ok(s),
        None => bail!(
            "unknown status '{}' (expected one of: {})",
            value,
            EntryStatus::ALL.map(|s| s.as_str()).join(", ")
        ),
    }
}

pub fn build_filter(entry_type: Option<&str>, status: Option<&str>) -> Result<EntryFilter> {
    Ok(EntryFilter {
        entry_type: entry_type.map(parse_entry_type).transpose()?,
        status: status.map(parse_status).transpose()?,
    })
}

pub async fn run_entries(
    config: &Config,
    user: Option<&str>,
    entry_type: Option<&str>,
    status: Option<&str>,
) -> Result<()> {
    let session = config.session.require(user)?;
    let filter = build_filter(entry_type, status)?;

    let store = SqliteStore::open(config).await?;
    let entries = store.list_entries(&session.user_id, &filter).await;
    store.close().await;
    let entries = entries?;

    if entries.is_empty() {
        println!("No entries.");
        return Ok(());
    }

    for entry in &entries {
        print_row(entry);
    }
    println!("{} entries", entries.len());

    Ok(())
}

fn print_row(entry: &Entry) {
    let done = entry.checklist.iter().filter(|i| i.done).count();
    let checklist = if entry.checklist.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", done, entry.checklist.len())
    };
    println!(
        "{}  {:<11} {:<8} {:<6} {}{}",
        entry.id,
        entry.status.as_str(),
        entry.entry_type.as_str(),
        entry.priority.map(|p| p.as_str()).unwrap_or("-"),
        first_line(&entry.content),
        checklist
    );
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or("").trim()
}

pub async fn run_status(config: &Config, user: Option<&str>, id: &str, status: &str) -> Result<()> {
    let session = config.session.require(user)?;
    let status = parse_status(status)?;

    let store = SqliteStore::open(config).await?;
    let result = tracker::update_entry_status(&store, &session.user_id, id, status).await;
    store.close().await;

    let entry = result?;
    println!("{} -> {}", entry.id, entry.status.as_str());
    Ok(())
}

pub async fn run_check(config: &Config, user: Option<&str>, id: &str, index: usize) -> Result<()> {
    let session = config.session.require(user)?;

    let store = SqliteStore::open(config).await?;
    let result = tracker::toggle_checklist_item(&store, &session.user_id, id, index).await;
    store.close().await;

    let entry = result?;
    for (i, item) in entry.checklist.iter().enumerate() {
        println!("{:>3}. [{}] {}", i, if item.done { "x" } else { " " }, item.text);
    }
    Ok(())
}
