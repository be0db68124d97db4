use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPerformance {
    pub correct: u32,
    pub attempts: u32,
}

impl WordPerformance {
    /// Fraction of attempts answered correctly, or `None` for an unseen word.
    pub fn accuracy(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(self.correct as f64 / self.attempts as f64)
        }
    }
}

/// Per-term answer history for one battle session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PerformanceMap {
    pub words: HashMap<String, WordPerformance>,
}

impl PerformanceMap {
    pub fn record(&mut self, term: &str, correct: bool) {
        let entry = self.words.entry(term.to_string()).or_default();
        entry.attempts += 1;
        if correct {
            entry.correct += 1;
        }
    }

    pub fn get(&self, term: &str) -> WordPerformance {
        self.words.get(term).copied().unwrap_or_default()
    }

    pub fn total_attempts(&self) -> u32 {
        self.words.values().map(|p| p.attempts).sum()
    }

    pub fn total_correct(&self) -> u32 {
        self.words.values().map(|p| p.correct).sum()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }
}
