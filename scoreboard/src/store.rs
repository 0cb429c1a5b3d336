//! The scoreboard store: single owner of the ranked board and its durable file
//!
//! Mutations (`submit`, `purge`) are serialized behind one writer lock. Each
//! mutation builds the next board on the side, makes it durable, and only then
//! publishes it, so the in-memory board and the file on disk move together.
//! Readers never take the writer lock; they clone the most recently published
//! board, which is immutable once published.
//!
//! Every mutation runs on its own spawned task. A caller that stops polling
//! (request cancelled, timeout) therefore cannot abandon the critical section
//! between the durable write and the publish.

use crate::board::Board;
use crate::error::Result;
use crate::persistence::SnapshotFile;
use log::{debug, info, warn};
use shared::{normalize_name, Entry, MAX_ENTRIES};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Where the board lives and how large it may grow
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Durable snapshot location
    pub path: PathBuf,
    /// Maximum number of ranked entries
    pub capacity: usize,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            capacity: MAX_ENTRIES,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("scores.json")
    }
}

/// Outcome of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// The entry as recorded, after name defaulting
    pub entry: Entry,
    /// 1-based rank the entry reached, `None` if it did not make the board
    pub rank: Option<usize>,
    /// The board right after this submission
    pub leaderboard: Vec<Entry>,
}

struct Inner {
    file: SnapshotFile,
    capacity: usize,
    writer: Mutex<()>,
    published: RwLock<Arc<Board>>,
}

/// Shared handle to one scoreboard
///
/// Cloning is cheap; all clones operate on the same board.
#[derive(Clone)]
pub struct ScoreStore {
    inner: Arc<Inner>,
}

impl ScoreStore {
    /// Opens the store, loading the durable snapshot if one exists
    ///
    /// A missing file yields an empty board. A file that cannot be parsed is
    /// reported as corrupt instead of being silently replaced.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let file = SnapshotFile::new(config.path);
        let board = match file.load().await? {
            Some(entries) => {
                let stored = entries.len();
                let board = Board::from_ranked(entries, config.capacity);
                if stored > board.len() {
                    warn!(
                        "Scoreboard file {:?} held {} entries, keeping top {}",
                        file.path(),
                        stored,
                        board.len()
                    );
                }
                info!("Loaded {} entries from {:?}", board.len(), file.path());
                board
            }
            None => {
                info!("No scoreboard at {:?}, starting empty", file.path());
                Board::new(config.capacity)
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                file,
                capacity: board.capacity(),
                writer: Mutex::new(()),
                published: RwLock::new(Arc::new(board)),
            }),
        })
    }

    /// Records a score under `name` (blank names become the default name)
    pub async fn submit(&self, name: &str, score: i64) -> Result<SubmitReceipt> {
        self.submit_entry(Entry::new(name, score)).await
    }

    /// Records an entry, substituting the default name for a blank one
    ///
    /// On error nothing changed, neither in memory nor on disk.
    pub async fn submit_entry(&self, mut entry: Entry) -> Result<SubmitReceipt> {
        entry.name = normalize_name(Some(&entry.name));
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.submit(entry).await }).await?
    }

    /// Clears the board and deletes its durable snapshot. Idempotent.
    pub async fn purge(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.purge().await }).await?
    }

    /// The current ranking, including every submission that has completed
    pub async fn snapshot(&self) -> Vec<Entry> {
        self.current().await.entries()
    }

    /// Whether `score` would make the board if submitted now
    pub async fn qualifies(&self, score: i64) -> bool {
        self.current().await.qualifies(score)
    }

    /// The rank `score` would reach if submitted now
    pub async fn potential_rank(&self, score: i64) -> Option<usize> {
        self.current().await.potential_rank(score)
    }

    pub async fn len(&self) -> usize {
        self.current().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.current().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn path(&self) -> &Path {
        self.inner.file.path()
    }

    async fn current(&self) -> Arc<Board> {
        Arc::clone(&*self.inner.published.read().await)
    }
}

impl Inner {
    async fn submit(&self, entry: Entry) -> Result<SubmitReceipt> {
        let _writer = self.writer.lock().await;

        let mut next = (**self.published.read().await).clone();
        let rank = next.insert(entry.clone());
        let leaderboard = next.entries();

        if let Err(e) = self.file.save(&leaderboard).await {
            warn!("Rejected score {} for {}: {}", entry.score, entry.name, e);
            return Err(e);
        }

        *self.published.write().await = Arc::new(next);

        match rank {
            Some(rank) => info!("{} scored {} (rank {})", entry.name, entry.score, rank),
            None => debug!("{} scored {} (not ranked)", entry.name, entry.score),
        }

        Ok(SubmitReceipt {
            entry,
            rank,
            leaderboard,
        })
    }

    async fn purge(&self) -> Result<()> {
        let _writer = self.writer.lock().await;

        let removed = self.file.remove().await?;
        *self.published.write().await = Arc::new(Board::new(self.capacity));

        if removed {
            info!("Purged scoreboard {:?}", self.file.path());
        } else {
            debug!("Purge of {:?}: nothing stored", self.file.path());
        }
        Ok(())
    }
}
