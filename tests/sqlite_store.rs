//! `SqliteStore` against a real database file.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tempfile::TempDir;

use capture_harness::config::{Config, DbConfig};
use capture_harness::migrate::run_migrations;
use capture_harness::sqlite_store::SqliteStore;
use capture_harness_core::classification::ClassificationResult;
use capture_harness_core::models::{
    ChecklistItem, Entry, EntryFilter, EntryMetadata, EntryStatus, EntryType, Goal, PeriodType,
    Priority,
};
use capture_harness_core::pipeline::Transport;
use capture_harness_core::router::{RoutedRecord, GOAL_TRIGGER_TAG};
use capture_harness_core::store::{Store, StoreError};
use capture_harness_core::tracker::{self, DEFAULT_CATEGORIES};
use capture_harness_core::{capture, ClassificationSource, ClassifierOutcome, Session};

fn test_config(tmp: &TempDir) -> Config {
    Config {
        db: DbConfig {
            path: tmp.path().join("data").join("cap.sqlite"),
        },
        classifier: Default::default(),
        server: Default::default(),
        session: Default::default(),
    }
}

async fn migrated_store(tmp: &TempDir) -> SqliteStore {
    let config = test_config(tmp);
    run_migrations(&config).await.unwrap();
    SqliteStore::open(&config).await.unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn entry(id: &str, user_id: &str, entry_type: EntryType, age_secs: i64) -> Entry {
    let at = Utc::now() - Duration::seconds(age_secs);
    Entry {
        id: id.to_string(),
        user_id: user_id.to_string(),
        content: format!("conteúdo {}", id),
        entry_type,
        status: EntryStatus::Pending,
        priority: None,
        category_id: None,
        metadata: EntryMetadata::default(),
        due_date: None,
        checklist: Vec::new(),
        created_at: at,
        updated_at: at,
    }
}

fn goal(id: &str, target: f64, period_start: NaiveDate) -> Goal {
    Goal {
        id: id.to_string(),
        user_id: "u1".to_string(),
        title: "correr".to_string(),
        category_id: None,
        emoji: None,
        target,
        unit: Some("km".to_string()),
        period_type: PeriodType::Weekly,
        period_start,
        current: 0.0,
        created_at: Utc::now(),
    }
}

/// Classifier that always answers with the same JSON.
struct FixedClassifier(&'static str);

#[async_trait]
impl ClassificationSource for FixedClassifier {
    async fn classify(&self, _: &Session, _: &str, _: NaiveDate) -> ClassifierOutcome {
        let value = serde_json::from_str(self.0).unwrap();
        ClassifierOutcome::Classified {
            result: ClassificationResult::from_value(&value).unwrap(),
            transport: Transport::Managed,
        }
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent_and_seed_categories() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    assert_eq!(run_migrations(&config).await.unwrap(), DEFAULT_CATEGORIES.len());
    assert_eq!(run_migrations(&config).await.unwrap(), 0);

    let store = SqliteStore::open(&config).await.unwrap();
    let slugs: Vec<String> = store
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.slug)
        .collect();
    assert_eq!(
        slugs,
        vec!["finance", "health", "home", "ideas", "learning", "personal", "work"]
    );
    assert!(store.find_category_by_slug("ideas").await.unwrap().is_some());
    assert!(store.find_category_by_slug("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_entry_fields_survive_storage() {
    let tmp = TempDir::new().unwrap();
    let store = migrated_store(&tmp).await;
    let work = store.find_category_by_slug("work").await.unwrap().unwrap();

    let mut original = entry("e1", "u1", EntryType::Task, 0);
    original.priority = Some(Priority::High);
    original.category_id = Some(work.id.clone());
    original.due_date = Some(date(2024, 3, 15));
    original.metadata = EntryMetadata {
        summary: Some("Mercado".into()),
        tags: vec!["compras".into()],
        emoji: Some("🛒".into()),
        goal_id: None,
    };
    original.checklist = vec![
        ChecklistItem { text: "leite".into(), done: false },
        ChecklistItem { text: "pão".into(), done: true },
    ];
    store.insert_entry(&original).await.unwrap();

    let loaded = store.get_entry("u1", "e1").await.unwrap().unwrap();
    assert_eq!(loaded.priority, Some(Priority::High));
    assert_eq!(loaded.category_id, Some(work.id));
    assert_eq!(loaded.due_date, Some(date(2024, 3, 15)));
    assert_eq!(loaded.metadata, original.metadata);
    assert_eq!(loaded.checklist, original.checklist);
    assert_eq!(
        loaded.created_at.timestamp_millis(),
        original.created_at.timestamp_millis()
    );

    assert!(store.get_entry("u2", "e1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_constraints_reported_as_violations() {
    let tmp = TempDir::new().unwrap();
    let store = migrated_store(&tmp).await;

    let mut orphan = entry("e1", "u1", EntryType::Note, 0);
    orphan.category_id = Some("no-such-category".into());
    let err = store.insert_entry(&orphan).await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation { ref table, .. } if table == "entries"));

    let blank_user = entry("e2", "  ", EntryType::Note, 0);
    assert!(matches!(
        store.insert_entry(&blank_user).await.unwrap_err(),
        StoreError::ConstraintViolation { .. }
    ));

    store.insert_entry(&entry("e3", "u1", EntryType::Note, 0)).await.unwrap();
    assert!(matches!(
        store.insert_entry(&entry("e3", "u1", EntryType::Note, 0)).await.unwrap_err(),
        StoreError::ConstraintViolation { .. }
    ));

    let err = store.insert_goal(&goal("g1", 0.0, date(2024, 3, 11))).await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation { ref table, .. } if table == "goals"));
}

#[tokio::test]
async fn test_list_entries_filters_and_orders() {
    let tmp = TempDir::new().unwrap();
    let store = migrated_store(&tmp).await;

    store.insert_entry(&entry("old", "u1", EntryType::Task, 60)).await.unwrap();
    store.insert_entry(&entry("new", "u1", EntryType::Task, 0)).await.unwrap();
    store.insert_entry(&entry("note", "u1", EntryType::Note, 30)).await.unwrap();
    store.insert_entry(&entry("other", "u2", EntryType::Task, 0)).await.unwrap();

    let all: Vec<String> = store
        .list_entries("u1", &EntryFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(all, vec!["new", "note", "old"]);

    let tasks = store
        .list_entries(
            "u1",
            &EntryFilter {
                entry_type: Some(EntryType::Task),
                status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(tasks.len(), 2);

    tracker::update_entry_status(&store, "u1", "old", EntryStatus::Done)
        .await
        .unwrap();
    let done = store
        .list_entries(
            "u1",
            &EntryFilter {
                entry_type: None,
                status: Some(EntryStatus::Done),
            },
        )
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, "old");
    assert!(done[0].updated_at > done[0].created_at);
}

#[tokio::test]
async fn test_updates_of_unknown_rows_are_not_found() {
    let tmp = TempDir::new().unwrap();
    let store = migrated_store(&tmp).await;

    let err = store
        .update_entry(&entry("missing", "u1", EntryType::Task, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: "entry", .. }));

    let err = store
        .update_goal(&goal("missing", 1.0, date(2024, 3, 11)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: "goal", .. }));
}

#[tokio::test]
async fn test_checklist_toggle_persists() {
    let tmp = TempDir::new().unwrap();
    let store = migrated_store(&tmp).await;

    let mut e = entry("e1", "u1", EntryType::Task, 0);
    e.checklist = vec![ChecklistItem { text: "leite".into(), done: false }];
    store.insert_entry(&e).await.unwrap();

    tracker::toggle_checklist_item(&store, "u1", "e1", 0).await.unwrap();
    let loaded = store.get_entry("u1", "e1").await.unwrap().unwrap();
    assert!(loaded.checklist[0].done);
}

#[tokio::test]
async fn test_goal_progress_rolls_over() {
    let tmp = TempDir::new().unwrap();
    let store = migrated_store(&tmp).await;
    store.insert_goal(&goal("g1", 10.0, date(2024, 3, 11))).await.unwrap();

    tracker::record_goal_progress(&store, "u1", "g1", 7.0, date(2024, 3, 13))
        .await
        .unwrap();
    let g = tracker::record_goal_progress(&store, "u1", "g1", 3.0, date(2024, 3, 20))
        .await
        .unwrap();
    assert_eq!(g.period_start, date(2024, 3, 18));
    assert_eq!(g.current, 3.0);

    let stored = store.get_goal("u1", "g1").await.unwrap().unwrap();
    assert_eq!(stored, g);
    assert_eq!(store.list_goals("u1").await.unwrap().len(), 1);
    assert!(store.list_goals("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_goal_capture_persists_goal_and_history() {
    let tmp = TempDir::new().unwrap();
    let store = migrated_store(&tmp).await;
    let classifier = FixedClassifier(
        r#"{"category_slug": "learning", "entry_type": "goal",
            "metadata": {"summary": "Ler 2 livros", "target": 2, "unit": "livros", "period_type": "monthly"}}"#,
    );

    let outcome = capture(
        &store,
        &classifier,
        Some(&Session::new("u1")),
        "ler 2 livros por mês",
        date(2024, 3, 14),
    )
    .await
    .unwrap();

    let RoutedRecord::Goal { goal, history } = outcome.record else {
        panic!("expected a goal");
    };
    assert_eq!(goal.period_start, date(2024, 3, 1));
    assert_eq!(goal.period_type, PeriodType::Monthly);
    assert_eq!(goal.target, 2.0);

    let stored_goal = store.get_goal("u1", &goal.id).await.unwrap().unwrap();
    assert_eq!(stored_goal.title, "Ler 2 livros");
    assert_eq!(stored_goal.unit.as_deref(), Some("livros"));

    let stored_history = store.get_entry("u1", &history.id).await.unwrap().unwrap();
    assert_eq!(stored_history.entry_type, EntryType::Task);
    assert_eq!(stored_history.metadata.goal_id.as_deref(), Some(goal.id.as_str()));
    assert!(stored_history
        .metadata
        .tags
        .iter()
        .any(|t| t == GOAL_TRIGGER_TAG));
    assert_eq!(stored_history.category_id, stored_goal.category_id);
}
