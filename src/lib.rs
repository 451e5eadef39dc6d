//! # Capture Harness
//!
//! Turns free-text captures ("comprar leite amanhã, urgente", "ler 2 livros
//! por mês") into typed entries and goals for a personal productivity
//! tracker.
//!
//! The pipeline itself lives in `capture-harness-core`; this crate supplies
//! the pieces that talk to the outside world: the HTTP classifier, the
//! SQLite store, the `cap` CLI and the JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │ CLI/HTTP │──▶│  Classifier  │──▶│ Normalizer │──▶│  Router  │
//! │ capture  │   │managed→direct│   │ + overrides│   │entry/goal│
//! └──────────┘   └──────────────┘   └────────────┘   └────┬─────┘
//!                                                         ▼
//!                                                    ┌──────────┐
//!                                                    │  SQLite  │
//!                                                    └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations and category seeding |
//! | [`sqlite_store`] | SQLite implementation of the store trait |
//! | [`classifier`] | HTTP classification client |
//! | [`capture`] | `cap capture` |
//! | [`entries`] | `cap entries`, `cap status`, `cap check` |
//! | [`goals`] | `cap goals`, `cap progress` |
//! | [`categories`] | `cap categories` |
//! | [`server`] | JSON HTTP API |

pub mod capture;
pub mod categories;
pub mod classifier;
pub mod config;
pub mod db;
pub mod entries;
pub mod goals;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
