//! Score submission gateway and a local scoreboard implementation.
//!
//! The simulation submits to two boards after every detonation commit:
//! board 1 carries the score, board 2 the special score, both in
//! highest-first order. The bundled [`LocalLeaderboard`] keeps the top 10
//! per board; a networked build would swap in its own gateway.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum entries kept per local board
pub const MAX_BOARD_ENTRIES: usize = 10;

/// How a submitted value competes with existing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// Keep the highest values, sorted descending
    HighestDescending,
}

/// Gateway failure. Logged and ignored by the commit pipeline.
#[derive(Debug, Error)]
#[error("leaderboard backend error: {0}")]
pub struct LeaderboardError(pub String);

/// Port to the external scoreboard service.
pub trait LeaderboardGateway {
    fn submit(&mut self, board: u32, value: f32, mode: WriteMode) -> Result<(), LeaderboardError>;
}

/// Local in-memory scoreboard, descending, trimmed to the top 10 per board.
#[derive(Debug, Default)]
pub struct LocalLeaderboard {
    boards: HashMap<u32, Vec<f32>>,
}

impl LocalLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a value would make it onto a board.
    pub fn qualifies(&self, board: u32, value: f32) -> bool {
        if value <= 0.0 {
            return false;
        }
        match self.boards.get(&board) {
            None => true,
            Some(entries) if entries.len() < MAX_BOARD_ENTRIES => true,
            Some(entries) => entries.last().map(|&low| value > low).unwrap_or(true),
        }
    }

    /// Entries for a board, best first.
    pub fn entries(&self, board: u32) -> &[f32] {
        self.boards.get(&board).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Best entry on a board, if any.
    pub fn top(&self, board: u32) -> Option<f32> {
        self.entries(board).first().copied()
    }
}

impl LeaderboardGateway for LocalLeaderboard {
    fn submit(&mut self, board: u32, value: f32, mode: WriteMode) -> Result<(), LeaderboardError> {
        match mode {
            WriteMode::HighestDescending => {
                if !self.qualifies(board, value) {
                    return Ok(());
                }
                let entries = self.boards.entry(board).or_default();
                // Insertion point in the descending order
                let pos = entries
                    .iter()
                    .position(|&e| value > e)
                    .unwrap_or(entries.len());
                entries.insert(pos, value);
                entries.truncate(MAX_BOARD_ENTRIES);
            }
        }
        Ok(())
    }
}
