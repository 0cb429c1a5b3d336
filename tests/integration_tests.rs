//! Integration tests for the scoreboard store
//!
//! These tests drive the store the way collaborators do: through the public
//! API, against real files, with real concurrency.

use rand::seq::SliceRandom;
use rand::Rng;
use scoreboard::persistence::SnapshotFile;
use scoreboard::{ScoreStore, StoreConfig, StoreError};
use shared::{Entry, Response, Submission, DEFAULT_NAME, MAX_ENTRIES};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// RANKING TESTS
mod ranking_tests {
    use super::*;

    /// Board length is min(capacity, submissions so far) after every submit
    #[tokio::test]
    async fn bounded_length() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        for i in 0..25 {
            let receipt = store.submit("p", i * 7 % 13).await.unwrap();
            let expected = ((i + 1) as usize).min(MAX_ENTRIES);
            assert_eq!(receipt.leaderboard.len(), expected);
            assert_eq!(store.len().await, expected);
        }
    }

    /// Every observed board is non-increasing by score
    #[tokio::test]
    async fn sorted_invariant_random_workload() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let scores: Vec<i64> = {
            let mut rng = rand::thread_rng();
            (0..100).map(|_| rng.gen_range(-50..50)).collect()
        };

        for score in scores {
            let receipt = store.submit("r", score).await.unwrap();
            assert_sorted(&receipt.leaderboard);
            assert_sorted(&store.snapshot().await);
        }
    }

    /// Equal scores keep submission order
    #[tokio::test]
    async fn tie_break_determinism() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.submit("A", 50).await.unwrap();
        store.submit("B", 50).await.unwrap();
        store.submit("C", 50).await.unwrap();

        assert_eq!(
            store.snapshot().await,
            vec![Entry::new("A", 50), Entry::new("B", 50), Entry::new("C", 50)]
        );
    }

    /// Submitting 1..=11 keeps 11 down to 2 and evicts 1
    #[tokio::test]
    async fn truncation_correctness() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        for score in 1..=11 {
            store.submit(&format!("p{}", score), score).await.unwrap();
        }

        let scores: Vec<i64> = store.snapshot().await.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![11, 10, 9, 8, 7, 6, 5, 4, 3, 2]);
    }

    /// Loosely typed input is coerced the way collaborators send it
    #[tokio::test]
    async fn submission_coercion() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        let bodies = [
            r#"{"name": "numeric", "score": 30}"#,
            r#"{"name": "text", "score": "20"}"#,
            r#"{"name": "garbage", "score": "lots"}"#,
            r#"{"score": 10}"#,
        ];
        for body in bodies {
            let submission: Submission = serde_json::from_str(body).unwrap();
            store.submit_entry(submission.into_entry()).await.unwrap();
        }

        assert_eq!(
            store.snapshot().await,
            vec![
                Entry::new("numeric", 30),
                Entry::new("text", 20),
                Entry::new(DEFAULT_NAME, 10),
                Entry::new("garbage", 0),
            ]
        );
    }
}

/// DURABILITY TESTS
mod durability_tests {
    use super::*;

    /// Reopening the store yields exactly the last persisted board
    #[tokio::test]
    async fn idempotent_reload() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        for (name, score) in [("a", 3), ("b", 8), ("c", 3), ("d", 1)] {
            store.submit(name, score).await.unwrap();
        }
        let before = store.snapshot().await;
        drop(store);

        let reopened = open_store(&dir).await;
        assert_eq!(reopened.snapshot().await, before);

        let again = open_store(&dir).await;
        assert_eq!(again.snapshot().await, before);
    }

    /// A cold start without a file is an empty board, not an error
    #[tokio::test]
    async fn cold_start_is_empty() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        assert!(store.snapshot().await.is_empty());
        assert!(store.is_empty().await);
    }

    /// A board written by the previous implementation loads as-is
    #[tokio::test]
    async fn adopts_existing_scores_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            board_path(&dir),
            "[\n  {\n    \"name\": \"old\",\n    \"score\": 40\n  },\n  {\n    \"name\": null,\n    \"score\": 25\n  },\n  {\n    \"name\": \"older\",\n    \"score\": 12\n  }\n]",
        )
        .unwrap();

        let store = open_store(&dir).await;
        assert_eq!(
            store.snapshot().await,
            vec![
                Entry::new("old", 40),
                Entry::new(DEFAULT_NAME, 25),
                Entry::new("older", 12),
            ]
        );

        // Rewritten with the default name filled in
        store.submit("newer", 1).await.unwrap();
        let on_disk = SnapshotFile::new(board_path(&dir)).load().await.unwrap().unwrap();
        assert_eq!(on_disk[1], Entry::new(DEFAULT_NAME, 25));
    }

    /// An unreadable file is surfaced instead of being treated as empty
    #[tokio::test]
    async fn corrupt_file_fails_loudly() {
        let dir = tempdir().unwrap();
        std::fs::write(board_path(&dir), "[{\"name\": \"trunc").unwrap();

        let result = ScoreStore::open(StoreConfig::new(board_path(&dir))).await;
        assert!(matches!(result, Err(StoreError::CorruptState { .. })));

        // The corrupt file is left for inspection
        assert!(board_path(&dir).exists());
    }

    /// A write that dies before the rename leaves the previous board loadable
    #[tokio::test]
    async fn crash_before_rename_keeps_previous_board() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.submit("safe", 5).await.unwrap();
        let before = store.snapshot().await;
        drop(store);

        // Half-written temp file from the interrupted write
        let file = SnapshotFile::new(board_path(&dir));
        std::fs::write(file.temp_path(), "[\n  {\n    \"name\": \"ha").unwrap();

        let reopened = open_store(&dir).await;
        assert_eq!(reopened.snapshot().await, before);

        reopened.submit("next", 6).await.unwrap();
        assert!(!file.temp_path().exists());
        assert_eq!(reopened.snapshot().await.len(), 2);
    }

    /// A failed write is reported and changes neither memory nor disk
    #[tokio::test]
    async fn failed_write_is_rejected_and_rolled_back() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.submit("safe", 5).await.unwrap();

        let file = SnapshotFile::new(board_path(&dir));
        std::fs::create_dir(file.temp_path()).unwrap();

        let result = store.submit("doomed", 100).await;
        let response = match result {
            Ok(receipt) => Response::Ok {
                leaderboard: receipt.leaderboard,
            },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        };
        assert!(!response.is_ok());

        assert_eq!(store.snapshot().await, vec![Entry::new("safe", 5)]);
        assert_eq!(
            file.load().await.unwrap(),
            Some(vec![Entry::new("safe", 5)])
        );

        std::fs::remove_dir(file.temp_path()).unwrap();
        let reopened = open_store(&dir).await;
        assert_eq!(reopened.snapshot().await, vec![Entry::new("safe", 5)]);
    }

    /// Purge empties the board, removes the file, and a new board starts fresh
    #[tokio::test]
    async fn purge_then_fresh_board() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        for score in 0..5 {
            store.submit("p", score).await.unwrap();
        }

        store.purge().await.unwrap();
        assert!(store.snapshot().await.is_empty());
        assert!(!board_path(&dir).exists());

        let reopened = open_store(&dir).await;
        assert!(reopened.snapshot().await.is_empty());

        let receipt = store.submit("fresh", 1).await.unwrap();
        assert_eq!(receipt.leaderboard, vec![Entry::new("fresh", 1)]);
        assert_eq!(receipt.rank, Some(1));
    }
}

/// CONCURRENCY TESTS
mod concurrency_tests {
    use super::*;

    /// Concurrent unique submissions: the top scores each appear exactly once
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn atomicity_under_concurrency() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        let mut scores: Vec<i64> = (1..=64).collect();
        scores.shuffle(&mut rand::thread_rng());

        let handles: Vec<_> = scores
            .iter()
            .map(|&score| {
                let store = store.clone();
                tokio::spawn(async move { store.submit(&format!("p{}", score), score).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let board = store.snapshot().await;
        assert_eq!(board.len(), MAX_ENTRIES);
        assert_sorted(&board);

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for entry in &board {
            *counts.entry(entry.score).or_default() += 1;
            assert_eq!(entry.name, format!("p{}", entry.score));
        }
        for score in 55..=64 {
            assert_eq!(counts.get(&score), Some(&1), "score {} not exactly once", score);
        }

        let on_disk = SnapshotFile::new(board_path(&dir)).load().await.unwrap();
        assert_eq!(on_disk, Some(board));
    }

    /// With room for everyone, no concurrent submission is lost
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn no_lost_updates() {
        let dir = tempdir().unwrap();
        let store = ScoreStore::open(StoreConfig::new(board_path(&dir)).with_capacity(200))
            .await
            .unwrap();

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = store.clone();
                // Ten writers per score to exercise tie ordering under contention
                tokio::spawn(async move { store.submit(&format!("w{}", i), i % 10).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let board = store.snapshot().await;
        assert_eq!(board.len(), 100);
        assert_sorted(&board);

        let mut names: Vec<String> = board.into_iter().map(|e| e.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 100);
    }

    /// Readers running alongside writers only ever see complete boards
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn readers_never_see_partial_state() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        let writers: Vec<_> = (0..40)
            .map(|score| {
                let store = store.clone();
                tokio::spawn(async move { store.submit("w", score).await })
            })
            .collect();

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut last_len = 0;
                    for _ in 0..200 {
                        let board = store.snapshot().await;
                        assert!(board.len() <= MAX_ENTRIES);
                        assert_sorted(&board);
                        // The board only grows until it is full
                        assert!(board.len() >= last_len);
                        last_len = board.len();
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        for reader in readers {
            reader.await.unwrap();
        }
    }

    /// A submit that completed is visible to the same caller right away
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn read_your_writes() {
        let dir = tempdir().unwrap();
        // Large enough that no submission is evicted by a later one
        let store = ScoreStore::open(StoreConfig::new(board_path(&dir)).with_capacity(32))
            .await
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let name = format!("c{}", i);
                    store.submit(&name, 1000 + i).await.unwrap();
                    let board = store.snapshot().await;
                    assert!(board.iter().any(|e| e.name == name));
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}

// HELPER FUNCTIONS

fn board_path(dir: &TempDir) -> PathBuf {
    dir.path().join("scores.json")
}

async fn open_store(dir: &TempDir) -> ScoreStore {
    ScoreStore::open(StoreConfig::new(board_path(dir)))
        .await
        .unwrap()
}

fn assert_sorted(entries: &[Entry]) {
    assert!(
        entries.windows(2).all(|w| w[0].score >= w[1].score),
        "board out of order: {:?}",
        entries
    );
}
