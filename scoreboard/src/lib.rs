//! # Scoreboard Library
//!
//! This library provides the shared top-N leaderboard: players submit a
//! `(name, score)` pair and get back the current ranking, while other callers
//! read the ranking whenever they like. It owns the ranked board in memory,
//! keeps a durable copy on disk, and stays correct when many callers use it at
//! the same time.
//!
//! ## Core Responsibilities
//!
//! ### Ranking
//! The board holds at most `capacity` entries (10 by default) sorted by
//! descending score. Equal scores are ordered by submission: the earlier
//! submission ranks higher, and that order survives re-sorting, truncation
//! and restarts.
//!
//! ### Durability
//! Every accepted submission rewrites the whole board to a JSON file through
//! a write-to-temp-then-rename sequence. An interrupted write leaves the
//! previous board in place; the file is never edited in place. On startup the
//! file is the source of truth. A missing file means an empty board; an
//! unreadable one is an error, never a silent reset.
//!
//! ### Concurrency
//! Submissions and purges are applied one at a time behind a single writer
//! lock, so no submission is lost or applied twice. Readers get the latest
//! fully published board without waiting for a write in progress.
//!
//! ## Module Organization
//!
//! ### Board Module (`board`)
//! The pure ranked collection: insert, sort, truncate, rank lookup.
//!
//! ### Persistence Module (`persistence`)
//! The durable snapshot file and its atomic replace protocol.
//!
//! ### Store Module (`store`)
//! The shared handle callers hold. Coordinates the board, the file and the
//! locks.
//!
//! ### Error Module (`error`)
//! Persistence, corruption and load failures.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use scoreboard::{ScoreStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Loads scores.json if it exists, otherwise starts empty
//!     let store = ScoreStore::open(StoreConfig::new("scores.json")).await?;
//!
//!     // Recorded, ranked and written to disk before this returns
//!     let receipt = store.submit("alice", 1200).await?;
//!     println!("alice is now rank {:?}", receipt.rank);
//!
//!     // Cheap read of the latest published board
//!     for (i, entry) in store.snapshot().await.iter().enumerate() {
//!         println!("{}. {} {}", i + 1, entry.name, entry.score);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Deployment Notes
//!
//! One store instance should own a given file. Several processes writing the
//! same file are not coordinated with each other; reading it from another
//! process is safe because it is only ever replaced atomically.
//!
//! `purge` deletes everything. Callers exposing it over a network are
//! expected to put it behind their own authorization.

pub mod board;
pub mod error;
pub mod persistence;
pub mod store;

pub use error::StoreError;
pub use store::{ScoreStore, StoreConfig, SubmitReceipt};
