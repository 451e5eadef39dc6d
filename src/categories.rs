//! `cap categories`.

use anyhow::Result;

use capture_harness_core::store::Store;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

pub async fn run_categories(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let categories = store.list_categories().await;
    store.close().await;
    let categories = categories?;

    if categories.is_empty() {
        println!("No categories. Run `cap init` first.");
        return Ok(());
    }

    for category in &categories {
        println!(
            "{:<10} {} {}",
            category.slug,
            category.emoji.as_deref().unwrap_or(" "),
            category.name
        );
    }
    Ok(())
}
