//! `cap capture`: run one capture through the pipeline and report what was saved.

use anyhow::Result;
use chrono::Local;

use capture_harness_core::models::Entry;
use capture_harness_core::router::RoutedRecord;
use capture_harness_core::{capture, AiStatus, CaptureError, CaptureOutcome};

use crate::classifier::create_classifier;
use crate::config::Config;
use crate::sqlite_store::SqliteStore;

pub async fn run_capture(
    config: &Config,
    user: Option<&str>,
    text: &str,
    json: bool,
) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let classifier = create_classifier(&config.classifier)?;
    let session = config.session.resolve(user);
    let today = Local::now().date_naive();

    let result = capture(&store, classifier.as_ref(), session.as_ref(), text, today).await;
    store.close().await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(CaptureError::Unauthenticated) => anyhow::bail!(
            "not signed in: pass --user or set [session].user_id in the config"
        ),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if let AiStatus::Unavailable { reason } = &outcome.ai {
        eprintln!(
            "Warning: AI classification unavailable ({}); saved with default classification.",
            reason
        );
    }

    Ok(())
}

fn print_outcome(outcome: &CaptureOutcome) {
    let category = outcome.category_slug.as_deref().unwrap_or("-");

    match &outcome.record {
        RoutedRecord::Entry { entry } => {
            println!("Saved {}.", entry.entry_type.as_str());
            print_entry(entry, category);
        }
        RoutedRecord::Goal { goal, history } => {
            println!("Saved goal.");
            println!("id:           {}", goal.id);
            println!("title:        {}", goal.title);
            println!(
                "target:       {} {} per {}",
                goal.target,
                goal.unit.as_deref().unwrap_or(""),
                goal.period_type.as_str()
            );
            println!("period_start: {}", goal.period_start);
            println!("category:     {}", category);
            println!("history:      {}", history.id);
        }
    }
}

fn print_entry(entry: &Entry, category: &str) {
    println!("id:           {}", entry.id);
    println!("type:         {}", entry.entry_type.as_str());
    println!("status:       {}", entry.status.as_str());
    println!(
        "priority:     {}",
        entry.priority.map(|p| p.as_str()).unwrap_or("-")
    );
    println!(
        "category:     {}{}",
        category,
        if entry.category_id.is_none() { " (uncategorized)" } else { "" }
    );
    if let Some(summary) = &entry.metadata.summary {
        println!("summary:      {}", summary);
    }
    if !entry.metadata.tags.is_empty() {
        println!("tags:         {}", entry.metadata.tags.join(", "));
    }
    if let Some(due) = entry.due_date {
        println!("due:          {}", due);
    }
    for item in &entry.checklist {
        println!("  [{}] {}", if item.done { "x" } else { " " }, item.text);
    }
}
