use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::catalog::Catalog;
use crate::engine::normalize::normalize_answer;
use crate::engine::performance::PerformanceMap;
use crate::engine::selector::{BattleAction, PowerTier};
use crate::session::guard::SubmissionGuard;

pub const BASIC_DAMAGE: u32 = 10;
pub const POWER_DAMAGE: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BattlePhase {
    Idle,
    SelectingHero,
    SelectingLocation,
    SelectingEnemy,
    Ready,
    Playing,
    Victory,
    Defeat,
}

impl BattlePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            BattlePhase::Idle => "idle",
            BattlePhase::SelectingHero => "selecting-hero",
            BattlePhase::SelectingLocation => "selecting-location",
            BattlePhase::SelectingEnemy => "selecting-enemy",
            BattlePhase::Ready => "ready",
            BattlePhase::Playing => "playing",
            BattlePhase::Victory => "victory",
            BattlePhase::Defeat => "defeat",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BattlePhase::Victory | BattlePhase::Defeat)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleOutcome {
    Victory,
    Defeat,
}

impl BattleOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            BattleOutcome::Victory => "victory",
            BattleOutcome::Defeat => "defeat",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Player,
    Enemy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Combatant {
    pub health: u32,
    pub max_health: u32,
}

impl Combatant {
    pub fn new(max_health: u32) -> Self {
        let max_health = max_health.max(1);
        Self {
            health: max_health,
            max_health,
        }
    }

    /// Subtract `amount`, flooring at zero. Returns the damage actually dealt.
    fn take_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.health);
        self.health -= dealt;
        dealt
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }
}

/// Observational record of what happened during a battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BattleEvent {
    PlayerHit {
        term: String,
        damage: u32,
        power: PowerTier,
        streak: u32,
    },
    PlayerMiss {
        term: String,
        expected: String,
    },
    EnemyHit {
        damage: u32,
    },
    Victory,
    Defeat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Hit {
        term: String,
        damage: u32,
        power: PowerTier,
    },
    /// `term` is the fallback term charged with the miss, `expected` its
    /// translation revealed to the player.
    Miss { term: String, expected: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerResolution {
    pub outcome: AnswerOutcome,
    pub terminal: Option<BattleOutcome>,
}

impl AnswerResolution {
    pub fn awaits_enemy(&self) -> bool {
        self.terminal.is_none()
    }
}

/// Turn-based battle state. Every transition called from the wrong phase is
/// ignored and reported as `false`/`None`.
pub struct Battle {
    catalog: Arc<Catalog>,
    phase: BattlePhase,
    turn: Turn,
    input_locked: bool,
    hero_id: Option<String>,
    location_id: Option<String>,
    enemy_id: Option<String>,
    multiplier: f64,
    player: Combatant,
    enemy: Combatant,
    turns_taken: u32,
    attempts: u32,
    correct: u32,
    streak: u32,
    longest_streak: u32,
    actions: Vec<BattleAction>,
    log: Vec<BattleEvent>,
    guard: Arc<SubmissionGuard>,
    epoch: u64,
}

impl Battle {
    pub fn new(catalog: Arc<Catalog>, player_max_health: u32) -> Self {
        Self {
            catalog,
            phase: BattlePhase::Idle,
            turn: Turn::Player,
            input_locked: false,
            hero_id: None,
            location_id: None,
            enemy_id: None,
            multiplier: 1.0,
            player: Combatant::new(player_max_health),
            enemy: Combatant::new(1),
            turns_taken: 0,
            attempts: 0,
            correct: 0,
            streak: 0,
            longest_streak: 0,
            actions: Vec::new(),
            log: Vec::new(),
            guard: Arc::new(SubmissionGuard::new()),
            epoch: 0,
        }
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    pub fn accepts_answer(&self) -> bool {
        self.phase == BattlePhase::Playing
            && self.turn == Turn::Player
            && !self.input_locked
            && !self.actions.is_empty()
    }

    pub fn player(&self) -> Combatant {
        self.player
    }

    pub fn enemy(&self) -> Combatant {
        self.enemy
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    pub fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    /// Answers resolved in this battle only.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct
    }

    pub fn actions(&self) -> &[BattleAction] {
        &self.actions
    }

    pub fn log(&self) -> &[BattleEvent] {
        &self.log
    }

    pub fn hero_id(&self) -> Option<&str> {
        self.hero_id.as_deref()
    }

    pub fn location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    pub fn enemy_id(&self) -> Option<&str> {
        self.enemy_id.as_deref()
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn guard(&self) -> &Arc<SubmissionGuard> {
        &self.guard
    }

    /// Battle instance counter; bumped by every reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            BattlePhase::Victory => Some(BattleOutcome::Victory),
            BattlePhase::Defeat => Some(BattleOutcome::Defeat),
            _ => None,
        }
    }

    pub fn start_selection(&mut self) -> bool {
        if self.phase != BattlePhase::Idle {
            trace!(phase = self.phase.as_str(), "start_selection ignored");
            return false;
        }
        self.phase = BattlePhase::SelectingHero;
        true
    }

    pub fn select_hero(&mut self, id: &str) -> bool {
        if self.phase != BattlePhase::SelectingHero || self.catalog.hero(id).is_none() {
            trace!(id, phase = self.phase.as_str(), "select_hero ignored");
            return false;
        }
        self.hero_id = Some(id.to_string());
        self.phase = BattlePhase::SelectingLocation;
        debug!(id, "hero selected");
        true
    }

    pub fn select_location(&mut self, id: &str) -> bool {
        if self.phase != BattlePhase::SelectingLocation || self.catalog.location(id).is_none() {
            trace!(id, phase = self.phase.as_str(), "select_location ignored");
            return false;
        }
        self.location_id = Some(id.to_string());
        self.phase = BattlePhase::SelectingEnemy;
        debug!(id, "location selected");
        true
    }

    pub fn select_enemy(&mut self, id: &str) -> bool {
        if self.phase != BattlePhase::SelectingEnemy {
            trace!(id, phase = self.phase.as_str(), "select_enemy ignored");
            return false;
        }
        let Some(multiplier) = self.catalog.enemy(id).map(|e| e.multiplier) else {
            trace!(id, "select_enemy ignored: unknown id");
            return false;
        };
        self.enemy_id = Some(id.to_string());
        self.multiplier = multiplier;
        self.phase = BattlePhase::Ready;
        debug!(id, multiplier, "enemy selected");
        true
    }

    pub fn initialize_battle(&mut self, enemy_max_health: u32) -> bool {
        if self.phase != BattlePhase::Ready {
            trace!(phase = self.phase.as_str(), "initialize_battle ignored");
            return false;
        }
        self.player = Combatant::new(self.player.max_health);
        self.enemy = Combatant::new(enemy_max_health);
        self.turn = Turn::Player;
        self.input_locked = false;
        self.turns_taken = 0;
        self.attempts = 0;
        self.correct = 0;
        self.streak = 0;
        self.longest_streak = 0;
        self.actions.clear();
        self.log.clear();
        self.phase = BattlePhase::Playing;
        debug!(enemy_max_health, player_max_health = self.player.max_health, "battle initialized");
        true
    }

    /// Replace the action set offered on the current player turn.
    pub fn offer_actions(&mut self, actions: Vec<BattleAction>) -> bool {
        if self.phase != BattlePhase::Playing || self.turn != Turn::Player || self.input_locked {
            trace!(phase = self.phase.as_str(), "offer_actions ignored");
            return false;
        }
        self.actions = actions;
        true
    }

    /// Resolve the player's answer against the offered actions. Damage and the
    /// performance update happen together; input stays locked until the enemy
    /// has attacked. No timers are involved, callers schedule the enemy turn.
    pub fn submit_answer(
        &mut self,
        raw: &str,
        performance: &mut PerformanceMap,
    ) -> Option<AnswerResolution> {
        if !self.accepts_answer() {
            trace!(phase = self.phase.as_str(), locked = self.input_locked, "submit_answer ignored");
            return None;
        }
        self.input_locked = true;
        self.attempts += 1;

        let answer = normalize_answer(raw);
        let matched = if answer.is_empty() {
            None
        } else {
            self.actions
                .iter()
                .find(|a| normalize_answer(&a.translation) == answer)
                .cloned()
        };

        let outcome = match matched {
            Some(action) => {
                let base = match action.power {
                    PowerTier::Power => POWER_DAMAGE,
                    PowerTier::Basic => BASIC_DAMAGE,
                };
                let damage = base + self.streak / 2;
                self.enemy.take_damage(damage);
                self.streak += 1;
                self.correct += 1;
                self.longest_streak = self.longest_streak.max(self.streak);
                performance.record(&action.term, true);
                debug!(term = %action.term, damage, streak = self.streak, "correct answer");
                self.log.push(BattleEvent::PlayerHit {
                    term: action.term.clone(),
                    damage,
                    power: action.power,
                    streak: self.streak,
                });
                AnswerOutcome::Hit {
                    term: action.term,
                    damage,
                    power: action.power,
                }
            }
            None => {
                self.streak = 0;
                let fallback = self.fallback_action().clone();
                performance.record(&fallback.term, false);
                debug!(term = %fallback.term, "incorrect answer");
                self.log.push(BattleEvent::PlayerMiss {
                    term: fallback.term.clone(),
                    expected: fallback.translation.clone(),
                });
                AnswerOutcome::Miss {
                    term: fallback.term,
                    expected: fallback.translation,
                }
            }
        };

        let terminal = self.check_terminal();
        if terminal.is_none() {
            self.turn = Turn::Enemy;
        }
        Some(AnswerResolution { outcome, terminal })
    }

    /// Term charged with an incorrect answer: the `power` action, else the
    /// first one offered. Only called with a non-empty action set.
    fn fallback_action(&self) -> &BattleAction {
        self.actions
            .iter()
            .find(|a| a.power == PowerTier::Power)
            .unwrap_or(&self.actions[0])
    }

    /// Apply the enemy's strike and hand the turn back to the player.
    pub fn enemy_attack(&mut self, damage: u32) -> Option<BattleOutcome> {
        if self.phase != BattlePhase::Playing || self.turn != Turn::Enemy {
            trace!(phase = self.phase.as_str(), "enemy_attack ignored");
            return None;
        }
        let dealt = self.player.take_damage(damage);
        self.log.push(BattleEvent::EnemyHit { damage: dealt });
        self.turns_taken += 1;
        self.turn = Turn::Player;
        self.input_locked = false;
        debug!(damage = dealt, player_health = self.player.health, turn = self.turns_taken, "enemy attacked");
        self.check_terminal()
    }

    fn check_terminal(&mut self) -> Option<BattleOutcome> {
        let outcome = if self.enemy.is_defeated() {
            BattleOutcome::Victory
        } else if self.player.is_defeated() {
            BattleOutcome::Defeat
        } else {
            return None;
        };

        self.phase = match outcome {
            BattleOutcome::Victory => BattlePhase::Victory,
            BattleOutcome::Defeat => BattlePhase::Defeat,
        };
        self.input_locked = true;
        self.log.push(match outcome {
            BattleOutcome::Victory => BattleEvent::Victory,
            BattleOutcome::Defeat => BattleEvent::Defeat,
        });
        info!(
            outcome = outcome.as_str(),
            turns = self.turns_taken,
            longest_streak = self.longest_streak,
            "battle finished"
        );
        Some(outcome)
    }

    /// Back to `idle`: drops the selection, streak, log and submission guard.
    pub fn reset(&mut self) {
        self.clear_battle();
        self.hero_id = None;
        self.location_id = None;
        self.enemy_id = None;
        self.multiplier = 1.0;
        self.phase = BattlePhase::Idle;
        debug!(epoch = self.epoch, "battle reset");
    }

    /// Restart hero selection from any phase other than `playing`.
    pub fn reset_selection(&mut self) -> bool {
        if self.phase == BattlePhase::Playing {
            trace!("reset_selection ignored while playing");
            return false;
        }
        self.clear_battle();
        self.hero_id = None;
        self.location_id = None;
        self.enemy_id = None;
        self.multiplier = 1.0;
        self.phase = BattlePhase::SelectingHero;
        debug!(epoch = self.epoch, "selection reset");
        true
    }

    fn clear_battle(&mut self) {
        self.player = Combatant::new(self.player.max_health);
        self.enemy = Combatant::new(1);
        self.turn = Turn::Player;
        self.input_locked = false;
        self.turns_taken = 0;
        self.attempts = 0;
        self.correct = 0;
        self.streak = 0;
        self.longest_streak = 0;
        self.actions.clear();
        self.log.clear();
        self.guard = Arc::new(SubmissionGuard::new());
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(term: &str, translation: &str, power: PowerTier) -> BattleAction {
        BattleAction {
            id: 0,
            term: term.to_string(),
            translation: translation.to_string(),
            power,
        }
    }

    fn ready_battle() -> Battle {
        let mut battle = Battle::new(Arc::new(Catalog::builtin()), 100);
        assert!(battle.start_selection());
        assert!(battle.select_hero("knight"));
        assert!(battle.select_location("forest"));
        assert!(battle.select_enemy("goblin"));
        battle
    }

    fn playing_battle(enemy_health: u32) -> Battle {
        let mut battle = ready_battle();
        assert!(battle.initialize_battle(enemy_health));
        battle.offer_actions(vec![
            action("gato", "cat", PowerTier::Power),
            action("perro", "dog", PowerTier::Basic),
        ]);
        battle
    }

    #[test]
    fn test_selection_flow() {
        let battle = ready_battle();
        assert_eq!(battle.phase(), BattlePhase::Ready);
        assert_eq!(battle.hero_id(), Some("knight"));
        assert_eq!(battle.enemy_id(), Some("goblin"));
        assert_eq!(battle.multiplier(), 1.0);
    }

    #[test]
    fn test_invalid_selection_is_noop() {
        let mut battle = Battle::new(Arc::new(Catalog::builtin()), 100);
        battle.start_selection();
        assert!(!battle.select_hero("wizard-king"));
        assert_eq!(battle.phase(), BattlePhase::SelectingHero);
        // Right id, wrong phase
        assert!(!battle.select_enemy("goblin"));
        assert_eq!(battle.phase(), BattlePhase::SelectingHero);
    }

    #[test]
    fn test_initialize_only_from_ready() {
        let mut battle = Battle::new(Arc::new(Catalog::builtin()), 100);
        assert!(!battle.initialize_battle(100));
        assert_eq!(battle.phase(), BattlePhase::Idle);
    }

    #[test]
    fn test_power_hit_and_streak_bonus() {
        let mut battle = playing_battle(200);
        let mut perf = PerformanceMap::default();

        let first = battle.submit_answer("CAT ", &mut perf).unwrap();
        assert_eq!(
            first.outcome,
            AnswerOutcome::Hit {
                term: "gato".to_string(),
                damage: POWER_DAMAGE,
                power: PowerTier::Power
            }
        );
        assert_eq!(battle.turn(), Turn::Enemy);
        battle.enemy_attack(1);

        battle.submit_answer("dog", &mut perf).unwrap();
        battle.enemy_attack(1);
        assert_eq!(battle.streak(), 2);

        // streak 2 -> +1 bonus
        let third = battle.submit_answer("dog", &mut perf).unwrap();
        assert!(matches!(third.outcome, AnswerOutcome::Hit { damage, .. } if damage == BASIC_DAMAGE + 1));
        assert_eq!(battle.enemy().health, 200 - 20 - 10 - 11);
    }

    #[test]
    fn test_miss_charges_power_fallback() {
        let mut battle = playing_battle(100);
        let mut perf = PerformanceMap::default();
        let res = battle.submit_answer("horse", &mut perf).unwrap();
        assert_eq!(
            res.outcome,
            AnswerOutcome::Miss {
                term: "gato".to_string(),
                expected: "cat".to_string()
            }
        );
        assert_eq!(perf.get("gato").attempts, 1);
        assert_eq!(perf.get("gato").correct, 0);
        assert_eq!(battle.turn(), Turn::Enemy);
    }

    #[test]
    fn test_miss_falls_back_to_first_without_power() {
        let mut battle = ready_battle();
        battle.initialize_battle(100);
        battle.offer_actions(vec![
            action("uno", "one", PowerTier::Basic),
            action("dos", "two", PowerTier::Basic),
        ]);
        let mut perf = PerformanceMap::default();
        battle.submit_answer("", &mut perf);
        assert_eq!(perf.get("uno").attempts, 1);
        assert_eq!(perf.get("dos").attempts, 0);
    }

    #[test]
    fn test_input_locked_until_enemy_attacks() {
        let mut battle = playing_battle(100);
        let mut perf = PerformanceMap::default();
        assert!(battle.submit_answer("cat", &mut perf).is_some());
        assert!(battle.is_input_locked());
        assert!(battle.submit_answer("cat", &mut perf).is_none());
        assert_eq!(perf.get("gato").attempts, 1);

        battle.enemy_attack(5);
        assert!(!battle.is_input_locked());
        assert_eq!(battle.turn(), Turn::Player);
        assert_eq!(battle.turns_taken(), 1);
    }

    #[test]
    fn test_enemy_attack_only_on_enemy_turn() {
        let mut battle = playing_battle(100);
        assert_eq!(battle.enemy_attack(10), None);
        assert_eq!(battle.player().health, 100);
        assert_eq!(battle.turns_taken(), 0);
    }

    #[test]
    fn test_player_health_floors_at_zero_and_defeats() {
        let mut battle = playing_battle(100);
        let mut perf = PerformanceMap::default();
        battle.submit_answer("nope", &mut perf);
        assert_eq!(battle.enemy_attack(500), Some(BattleOutcome::Defeat));
        assert_eq!(battle.player().health, 0);
        assert_eq!(battle.phase(), BattlePhase::Defeat);
        assert_eq!(battle.log().last(), Some(&BattleEvent::Defeat));
    }

    #[test]
    fn test_no_actions_means_no_answer() {
        let mut battle = ready_battle();
        battle.initialize_battle(100);
        let mut perf = PerformanceMap::default();
        assert!(battle.submit_answer("cat", &mut perf).is_none());
        assert!(!battle.is_input_locked());
    }

    #[test]
    fn test_reset_clears_state_and_guard() {
        let mut battle = playing_battle(10);
        let mut perf = PerformanceMap::default();
        battle.submit_answer("cat", &mut perf);
        assert_eq!(battle.phase(), BattlePhase::Victory);
        assert!(battle.guard().try_claim());

        let epoch = battle.epoch();
        battle.reset();
        assert_eq!(battle.phase(), BattlePhase::Idle);
        assert_eq!(battle.streak(), 0);
        assert!(battle.log().is_empty());
        assert!(!battle.guard().is_claimed());
        assert!(battle.epoch() > epoch);
        assert_eq!(battle.hero_id(), None);
    }

    #[test]
    fn test_reset_selection_refused_while_playing() {
        let mut battle = playing_battle(100);
        assert!(!battle.reset_selection());
        assert_eq!(battle.phase(), BattlePhase::Playing);

        let mut battle = ready_battle();
        assert!(battle.reset_selection());
        assert_eq!(battle.phase(), BattlePhase::SelectingHero);
    }

    #[test]
    fn test_terminal_is_irreversible_without_reset() {
        let mut battle = playing_battle(10);
        let mut perf = PerformanceMap::default();
        battle.submit_answer("cat", &mut perf);
        assert_eq!(battle.phase(), BattlePhase::Victory);
        assert!(!battle.initialize_battle(100));
        assert_eq!(battle.enemy_attack(5), None);
        assert!(!battle.offer_actions(Vec::new()));
        assert_eq!(battle.phase(), BattlePhase::Victory);
    }
}
