use std::collections::VecDeque;
use tokio::sync::RwLock;

use crate::models::LeaderboardEntry;

pub const LEADERBOARD_CAPACITY: usize = 10;

/// Most-recent-first history of successful matches across all users.
pub struct Leaderboard {
    capacity: usize,
    entries: RwLock<VecDeque<LeaderboardEntry>>,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::with_capacity(LEADERBOARD_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity + 1)),
        }
    }

    /// Insert at the front and drop whatever falls past the cap, under one lock.
    pub async fn record(&self, entry: LeaderboardEntry) {
        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    pub async fn snapshot(&self) -> Vec<LeaderboardEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
