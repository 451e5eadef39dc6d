//! # Capture Harness CLI (`cap`)
//!
//! ## Usage
//!
//! ```bash
//! cap --config ./config/cap.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cap init` | Create the database and seed default categories |
//! | `cap capture <text>` | Classify and save a capture |
//! | `cap entries` | List entries, optionally by `--type` / `--status` |
//! | `cap status <id> <status>` | Move an entry to another column |
//! | `cap check <id> <index>` | Toggle a checklist item |
//! | `cap goals` | List goals |
//! | `cap progress <goal_id>` | Record progress on a goal |
//! | `cap categories` | List categories |
//! | `cap serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! cap init
//! cap capture "comprar leite amanhã, urgente" --user me
//! cap entries --type task --status pending --user me
//! cap progress 3f1c... --by 2 --user me
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use capture_harness::{capture, categories, config, entries, goals, logging, migrate, server};

/// Capture Harness: capture free text, classify it, and file it as a task,
/// note, insight, bookmark, or goal.
#[derive(Parser)]
#[command(
    name = "cap",
    about = "Capture Harness: classify free-text captures into tasks, notes, insights, bookmarks and goals",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cap.toml")]
    config: PathBuf,

    /// User to act as. Overrides `[session].user_id`.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema and seed the default categories.
    ///
    /// Idempotent: running it again adds nothing that already exists.
    Init,

    /// Classify a capture and save it.
    ///
    /// When the classifier is unreachable or answers garbage the capture
    /// is still saved, as a medium-priority note in the default category,
    /// and a warning is printed.
    Capture {
        /// Capture text. Multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List entries, newest first.
    Entries {
        /// Only entries of this type (task, note, insight, bookmark).
        #[arg(long = "type")]
        entry_type: Option<String>,

        /// Only entries with this status (pending, in_progress, done).
        #[arg(long)]
        status: Option<String>,
    },

    /// Move an entry to another status.
    Status {
        id: String,
        /// New status: pending, in_progress or done.
        status: String,
    },

    /// Toggle the checklist item at `index` (0-based).
    Check { id: String, index: usize },

    /// List goals.
    Goals,

    /// Record progress on a goal.
    Progress {
        goal_id: String,

        /// Amount to add. Negative values subtract.
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        by: f64,
    },

    /// List categories.
    Categories,

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve => "info",
        _ => "warn",
    };
    logging::init(cli.log_json, default_level);

    let cfg = config::load_config(&cli.config)?;
    let user = cli.user.as_deref();

    match cli.command {
        Commands::Init => {
            let seeded = migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
            if seeded > 0 {
                println!("Added {} default categories.", seeded);
            }
        }
        Commands::Capture { text, json } => {
            capture::run_capture(&cfg, user, &text.join(" "), json).await?;
        }
        Commands::Entries { entry_type, status } => {
            entries::run_entries(&cfg, user, entry_type.as_deref(), status.as_deref()).await?;
        }
        Commands::Status { id, status } => {
            entries::run_status(&cfg, user, &id, &status).await?;
        }
        Commands::Check { id, index } => {
            entries::run_check(&cfg, user, &id, index).await?;
        }
        Commands::Goals => {
            goals::run_goals(&cfg, user).await?;
        }
        Commands::Progress { goal_id, by } => {
            goals::run_progress(&cfg, user, &goal_id, by).await?;
        }
        Commands::Categories => {
            categories::run_categories(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
