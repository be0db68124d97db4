use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::engine::performance::{PerformanceMap, WordPerformance};
use crate::vocabulary::VocabularyItem;

/// Weight of a word that has never been attempted. Every attempted word
/// scores strictly below this (at most 1.5).
const UNSEEN_WEIGHT: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerTier {
    Basic,
    Power,
}

impl PowerTier {
    pub fn as_str(self) -> &'static str {
        match self {
            PowerTier::Basic => "basic",
            PowerTier::Power => "power",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleAction {
    /// Position of the term in the vocabulary pool.
    pub id: usize,
    pub term: String,
    pub translation: String,
    pub power: PowerTier,
}

#[derive(Clone, Copy, Debug)]
pub struct SelectOptions {
    pub count: usize,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self { count: 3 }
    }
}

/// Selection weight, inversely proportional to mastery: fewer attempts and a
/// lower hit ratio both push it up.
pub fn selection_weight(perf: WordPerformance) -> f64 {
    match perf.accuracy() {
        None => UNSEEN_WEIGHT,
        Some(ratio) => (1.0 - ratio) + 1.0 / (perf.attempts as f64 + 1.0),
    }
}

/// Offer the `opts.count` least-mastered words, weakest first. Ties keep
/// vocabulary pool order, so the result is a pure function of its inputs.
pub fn select_actions(
    vocabulary: &[VocabularyItem],
    performance: &PerformanceMap,
    opts: &SelectOptions,
) -> Vec<BattleAction> {
    let ranked = rank_candidates(vocabulary, performance);
    build_actions(vocabulary, ranked, opts.count)
}

/// Same ranking as [`select_actions`], but words of equal weight are shuffled
/// with `rng` instead of keeping pool order.
pub fn select_actions_with_rng<R: Rng + ?Sized>(
    vocabulary: &[VocabularyItem],
    performance: &PerformanceMap,
    opts: &SelectOptions,
    rng: &mut R,
) -> Vec<BattleAction> {
    let mut ranked = rank_candidates(vocabulary, performance);

    let mut start = 0;
    while start < ranked.len() {
        let weight = ranked[start].1;
        let end = ranked[start..]
            .iter()
            .position(|&(_, w)| w != weight)
            .map_or(ranked.len(), |offset| start + offset);
        ranked[start..end].shuffle(rng);
        start = end;
    }

    build_actions(vocabulary, ranked, opts.count)
}

fn rank_candidates(vocabulary: &[VocabularyItem], performance: &PerformanceMap) -> Vec<(usize, f64)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ranked: Vec<(usize, f64)> = vocabulary
        .iter()
        .enumerate()
        .filter(|(_, item)| seen.insert(item.term.as_str()))
        .map(|(idx, item)| (idx, selection_weight(performance.get(&item.term))))
        .collect();

    // Stable: equal weights stay in pool order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

fn build_actions(
    vocabulary: &[VocabularyItem],
    ranked: Vec<(usize, f64)>,
    count: usize,
) -> Vec<BattleAction> {
    ranked
        .into_iter()
        .take(count.max(1))
        .enumerate()
        .map(|(rank, (idx, _))| {
            let item = &vocabulary[idx];
            BattleAction {
                id: idx,
                term: item.term.clone(),
                translation: item.translation.clone(),
                power: if rank == 0 {
                    PowerTier::Power
                } else {
                    PowerTier::Basic
                },
            }
        })
        .collect()
}
