use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::scaling::scale_battle_xp;
use crate::engine::xp::{XpInputs, calculate_xp};
use crate::session::battle::{Battle, BattleOutcome};

/// End-of-battle numbers the XP pipeline and the backend consume.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleMetrics {
    pub hero_id: String,
    pub location_id: String,
    pub enemy_id: String,
    pub multiplier: f64,
    pub player_health: u32,
    pub player_max_health: u32,
    pub turns_taken: u32,
    pub max_turns: u32,
    pub longest_streak: u32,
    pub total_attempts: u32,
    pub total_correct: u32,
    /// Percent of attempts answered correctly; 100 when nothing was attempted.
    pub accuracy: f64,
}

impl BattleMetrics {
    /// Totals cover this battle only, never earlier battles of the session.
    pub fn collect(battle: &Battle, max_turns: u32) -> Self {
        let total_attempts = battle.attempts();
        let total_correct = battle.correct_answers();
        let accuracy = if total_attempts > 0 {
            (total_correct as f64 / total_attempts as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };

        Self {
            hero_id: battle.hero_id().unwrap_or_default().to_string(),
            location_id: battle.location_id().unwrap_or_default().to_string(),
            enemy_id: battle.enemy_id().unwrap_or_default().to_string(),
            multiplier: battle.multiplier(),
            player_health: battle.player().health,
            player_max_health: battle.player().max_health,
            turns_taken: battle.turns_taken(),
            max_turns,
            longest_streak: battle.longest_streak(),
            total_attempts,
            total_correct,
            accuracy,
        }
    }

    pub fn xp_inputs(&self) -> XpInputs {
        XpInputs {
            player_health: self.player_health,
            player_max_health: self.player_max_health,
            turns_taken: self.turns_taken,
            max_turns: self.max_turns,
            longest_streak: self.longest_streak,
        }
    }

    /// Performance score scaled by the enemy multiplier.
    pub fn xp(&self) -> u32 {
        scale_battle_xp(calculate_xp(&self.xp_inputs()), self.multiplier)
    }
}

/// Payload sent to the ranking backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSubmission {
    pub xp: u32,
    pub accuracy: f64,
    pub total_attempts: u32,
    pub total_correct: u32,
    pub turns_taken: u32,
    pub hero_id: String,
    pub enemy_id: String,
    pub outcome: BattleOutcome,
}

impl ResultSubmission {
    pub fn new(outcome: BattleOutcome, metrics: &BattleMetrics) -> Self {
        Self {
            xp: metrics.xp(),
            accuracy: metrics.accuracy,
            total_attempts: metrics.total_attempts,
            total_correct: metrics.total_correct,
            turns_taken: metrics.turns_taken,
            hero_id: metrics.hero_id.clone(),
            enemy_id: metrics.enemy_id.clone(),
            outcome,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub xp_earned: u32,
}

/// A submitted battle as kept in local history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleRecord {
    pub outcome: BattleOutcome,
    pub xp: u32,
    pub accuracy: f64,
    pub total_attempts: u32,
    pub total_correct: u32,
    pub turns_taken: u32,
    pub hero_id: String,
    pub enemy_id: String,
    pub timestamp: DateTime<Utc>,
}

impl BattleRecord {
    pub fn from_submission(submission: &ResultSubmission) -> Self {
        Self {
            outcome: submission.outcome,
            xp: submission.xp,
            accuracy: submission.accuracy,
            total_attempts: submission.total_attempts,
            total_correct: submission.total_correct,
            turns_taken: submission.turns_taken,
            hero_id: submission.hero_id.clone(),
            enemy_id: submission.enemy_id.clone(),
            timestamp: Utc::now(),
        }
    }
}
