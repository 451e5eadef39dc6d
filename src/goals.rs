//! `cap goals` and `cap progress`.

use anyhow::Result;
use chrono::Local;

use capture_harness_core::models::{Goal, PeriodType};
use capture_harness_core::store::Store;
use capture_harness_core::tracker::{self, goal_reached};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

pub async fn run_goals(config: &Config, user: Option<&str>) -> Result<()> {
    let session = config.session.require(user)?;

    let store = SqliteStore::open(config).await?;
    let goals = store.list_goals(&session.user_id).await;
    store.close().await;
    let goals = goals?;

    if goals.is_empty() {
        println!("No goals.");
        return Ok(());
    }

    for goal in &goals {
        print_goal(goal);
    }
    Ok(())
}

pub async fn run_progress(
    config: &Config,
    user: Option<&str>,
    goal_id: &str,
    amount: f64,
) -> Result<()> {
    let session = config.session.require(user)?;
    let today = Local::now().date_naive();

    let store = SqliteStore::open(config).await?;
    let result =
        tracker::record_goal_progress(&store, &session.user_id, goal_id, amount, today).await;
    store.close().await;

    let goal = result?;
    print_goal(&goal);
    if goal_reached(&goal) {
        println!("Target reached for this {}.", period_noun(&goal));
    }
    Ok(())
}

fn print_goal(goal: &Goal) {
    println!(
        "{}  {}{}  {}/{}{}  ({} from {})",
        goal.id,
        goal.emoji.as_deref().map(|e| format!("{} ", e)).unwrap_or_default(),
        goal.title,
        goal.current,
        goal.target,
        goal.unit.as_deref().map(|u| format!(" {}", u)).unwrap_or_default(),
        goal.period_type.as_str(),
        goal.period_start
    );
}

fn period_noun(goal: &Goal) -> &'static str {
    match goal.period_type {
        PeriodType::Daily => "day",
        PeriodType::Weekly => "week",
        PeriodType::Monthly => "month",
    }
}
