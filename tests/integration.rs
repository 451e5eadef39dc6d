use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cap_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cap"))
}

/// A config whose classifier points at a closed local port, so every
/// capture takes the unavailable path.
fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let closed_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config_content = format!(
        r#"[db]
path = "{}/data/cap.sqlite"

[classifier]
functions_url = "http://127.0.0.1:{}/functions/v1"
anon_key = "test-anon"
timeout_secs = 5

[server]
bind = "127.0.0.1:7341"
"#,
        root.display(),
        closed_port
    );

    let config_path = config_dir.join("cap.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_cap(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cap_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cap binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn init(config_path: &Path) {
    let (stdout, stderr, success) = run_cap(config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized successfully."));
}

fn capture_json(config_path: &Path, text: &str) -> Value {
    let (stdout, stderr, success) =
        run_cap(config_path, &["capture", text, "--user", "u1", "--json"]);
    assert!(success, "capture failed: {}", stderr);
    serde_json::from_str(&stdout).unwrap()
}

#[test]
fn test_init_creates_database_and_categories() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_cap(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("Added 7 default categories."));
    assert!(tmp.path().join("data/cap.sqlite").exists());

    // Idempotent
    let (stdout, _, success) = run_cap(&config_path, &["init"]);
    assert!(success);
    assert!(!stdout.contains("default categories"));

    let (stdout, _, success) = run_cap(&config_path, &["categories"]);
    assert!(success);
    for slug in ["ideas", "work", "personal", "health", "finance", "learning", "home"] {
        assert!(stdout.contains(slug), "missing category {}: {}", slug, stdout);
    }
}

#[test]
fn test_capture_saved_when_classifier_unreachable() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);

    let (stdout, stderr, success) = run_cap(
        &config_path,
        &["capture", "comprar", "leite", "urgente", "--user", "u1"],
    );
    assert!(success, "capture failed: {}", stderr);
    assert!(stdout.contains("Saved note."));
    assert!(stdout.contains("priority:     urgent"));
    assert!(stdout.contains("category:     ideas"));
    assert!(stderr.contains("AI classification unavailable"));
}

#[test]
fn test_capture_json_outcome() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);

    let outcome = capture_json(&config_path, "estou lendo um livro");
    assert_eq!(outcome["ai"]["status"], "unavailable");
    assert_eq!(outcome["record"]["kind"], "entry");
    let entry = &outcome["record"]["entry"];
    assert_eq!(entry["entry_type"], "note");
    assert_eq!(entry["status"], "in_progress");
    assert_eq!(entry["priority"], "medium");
    assert_eq!(entry["content"], "estou lendo um livro");
    assert!(entry["category_id"].is_string());
}

#[test]
fn test_capture_without_user_fails() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);

    let (_, stderr, success) = run_cap(&config_path, &["capture", "comprar leite"]);
    assert!(!success);
    assert!(stderr.contains("not signed in"), "stderr: {}", stderr);

    let (_, stderr, success) = run_cap(&config_path, &["entries"]);
    assert!(!success);
    assert!(stderr.contains("--user"), "stderr: {}", stderr);
}

#[test]
fn test_entries_listing_and_status_moves() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);

    let first = capture_json(&config_path, "ideia para o blog");
    capture_json(&config_path, "outra ideia");
    let id = first["record"]["entry"]["id"].as_str().unwrap().to_string();

    let (stdout, _, success) = run_cap(&config_path, &["entries", "--user", "u1"]);
    assert!(success);
    assert!(stdout.contains("2 entries"));

    let (stdout, stderr, success) =
        run_cap(&config_path, &["status", id.as_str(), "done", "--user", "u1"]);
    assert!(success, "status failed: {}", stderr);
    assert!(stdout.contains(&format!("{} -> done", id)));

    let (stdout, _, success) =
        run_cap(&config_path, &["entries", "--status", "done", "--user", "u1"]);
    assert!(success);
    assert!(stdout.contains(&id));
    assert!(stdout.contains("1 entries"));

    // Another user sees nothing
    let (stdout, _, success) = run_cap(&config_path, &["entries", "--user", "u2"]);
    assert!(success);
    assert!(stdout.contains("No entries."));
}

#[test]
fn test_invalid_arguments_rejected() {
    let (_tmp, config_path) = setup_test_env();
    init(&config_path);

    let (_, stderr, success) =
        run_cap(&config_path, &["entries", "--type", "goal", "--user", "u1"]);
    assert!(!success);
    assert!(stderr.contains("unknown entry type"));

    let (_, stderr, success) =
        run_cap(&config_path, &["status", "nope", "archived", "--user", "u1"]);
    assert!(!success);
    assert!(stderr.contains("unknown status"));

    let (_, stderr, success) =
        run_cap(&config_path, &["status", "nope", "done", "--user", "u1"]);
    assert!(!success);
    assert!(stderr.contains("entry not found"));

    let entry = capture_json(&config_path, "nota sem checklist");
    let id = entry["record"]["entry"]["id"].as_str().unwrap().to_string();
    let (_, stderr, success) = run_cap(&config_path, &["check", id.as_str(), "0", "--user", "u1"]);
    assert!(!success);
    assert!(stderr.contains("out of range"));

    let (_, stderr, success) =
        run_cap(&config_path, &["progress", "nope", "--by", "-1", "--user", "u1"]);
    assert!(!success);
    assert!(stderr.contains("goal not found"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_cap(&tmp.path().join("absent.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
