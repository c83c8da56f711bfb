//! High score leaderboard
//!
//! Receives final scores at game over. Kept in memory; hosts that want
//! persistence can round-trip it through JSON.

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Destination for the final score of a run
pub trait ScoreSink {
    fn submit(&mut self, final_score: u64);
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Cargo units delivered
    pub score: u64,
    /// Run number this score came from (1-based, per leaderboard)
    pub run: u32,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
    /// Runs submitted so far, qualifying or not
    pub runs: u32,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Record a finished run
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64) -> Option<usize> {
        self.runs += 1;
        let rank = self.potential_rank(score)?;
        let entry = HighScoreEntry { score, run: self.runs };
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut scores: HighScores = serde_json::from_str(json)?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl ScoreSink for HighScores {
    fn submit(&mut self, final_score: u64) {
        match self.add_score(final_score) {
            Some(rank) => log::info!("Score {} entered the leaderboard at #{}", final_score, rank),
            None => log::info!("Score {} did not place", final_score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.add_score(0), None);
        assert!(scores.is_empty());
        assert_eq!(scores.runs, 1);
    }

    #[test]
    fn test_sorted_descending() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(10), Some(1));
        assert_eq!(scores.add_score(30), Some(1));
        assert_eq!(scores.add_score(20), Some(2));
        let ordered: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(ordered, vec![30, 20, 10]);
        assert_eq!(scores.top_score(), Some(30));
        assert_eq!(scores.entries[0].run, 2);
    }

    #[test]
    fn test_full_board_drops_lowest() {
        let mut scores = HighScores::new();
        for s in 1..=MAX_HIGH_SCORES as u64 {
            scores.add_score(s * 10);
        }
        assert!(!scores.qualifies(10));
        assert_eq!(scores.potential_rank(15), Some(MAX_HIGH_SCORES));
        scores.submit(15);
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(15));
    }

    #[test]
    fn test_json_round_trip_sorts() {
        let json = r#"{"entries":[{"score":3,"run":1},{"score":9,"run":2}],"runs":2}"#;
        let scores = HighScores::from_json(json).unwrap();
        assert_eq!(scores.top_score(), Some(9));
        let back = HighScores::from_json(&scores.to_json().unwrap()).unwrap();
        assert_eq!(back.entries, scores.entries);
        let err = HighScores::from_json("not json").unwrap_err();
        assert!(err.is_syntax());
        assert!(!err.to_string().contains("config"));
    }
}
