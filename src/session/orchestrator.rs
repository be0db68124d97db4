use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::backend::{BackendError, ResultBackend};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::engine::performance::PerformanceMap;
use crate::engine::scaling::{roll_enemy_damage, scale_enemy_health};
use crate::engine::selector::{SelectOptions, select_actions_with_rng};
use crate::session::battle::{AnswerResolution, Battle, BattleOutcome, BattlePhase, Turn};
use crate::session::guard::{OutcomeReport, ResultReporter};
use crate::session::result::BattleMetrics;
use crate::vocabulary::VocabularyItem;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("vocabulary pool is empty, no actions can be offered")]
    NoVocabulary,
    #[error("hero, location and enemy must be selected before the battle starts")]
    IncompleteSelection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    pub action_count: usize,
    pub player_max_health: u32,
    pub max_turns: u32,
    pub enemy_turn_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            action_count: config.action_count,
            player_max_health: config.player_max_health,
            max_turns: config.max_turns,
            enemy_turn_delay: Duration::from_millis(config.enemy_turn_delay_ms),
        }
    }
}

/// Permission for one enemy turn, tied to the battle instance that issued it.
/// Redeeming it after a reset does nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemyTurnTicket {
    epoch: u64,
    pub delay: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerTurn {
    pub resolution: AnswerResolution,
    pub enemy_turn: Option<EnemyTurnTicket>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemyStrike {
    pub damage: u32,
    pub terminal: Option<BattleOutcome>,
}

/// Owns everything one player's battles need: the vocabulary pool, the
/// per-word performance map, the random source and the battle itself.
/// UI layers hold a `BattleSession` and read the battle through `battle()`.
pub struct BattleSession {
    settings: SessionSettings,
    vocabulary: Vec<VocabularyItem>,
    performance: PerformanceMap,
    battle: Battle,
    rng: SmallRng,
}

impl BattleSession {
    pub fn new(
        settings: SessionSettings,
        catalog: Arc<Catalog>,
        vocabulary: Vec<VocabularyItem>,
        rng: SmallRng,
    ) -> Self {
        let battle = Battle::new(catalog, settings.player_max_health);
        Self {
            settings,
            vocabulary,
            performance: PerformanceMap::default(),
            battle,
            rng,
        }
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn performance(&self) -> &PerformanceMap {
        &self.performance
    }

    pub fn vocabulary(&self) -> &[VocabularyItem] {
        &self.vocabulary
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn start_selection(&mut self) -> bool {
        self.battle.start_selection()
    }

    pub fn select_hero(&mut self, id: &str) -> bool {
        self.battle.select_hero(id)
    }

    pub fn select_location(&mut self, id: &str) -> bool {
        self.battle.select_location(id)
    }

    pub fn select_enemy(&mut self, id: &str) -> bool {
        self.battle.select_enemy(id)
    }

    /// Scale the chosen enemy, start the battle and offer the first actions.
    pub fn begin_battle(&mut self) -> Result<(), SessionError> {
        if self.battle.phase() != BattlePhase::Ready {
            return Err(SessionError::IncompleteSelection);
        }
        if self.vocabulary.is_empty() {
            return Err(SessionError::NoVocabulary);
        }
        let enemy_health = scale_enemy_health(self.battle.multiplier());
        self.battle.initialize_battle(enemy_health);
        self.refresh_actions();
        Ok(())
    }

    fn refresh_actions(&mut self) {
        let opts = SelectOptions {
            count: self.settings.action_count,
        };
        let actions =
            select_actions_with_rng(&self.vocabulary, &self.performance, &opts, &mut self.rng);
        trace!(count = actions.len(), "offering actions");
        self.battle.offer_actions(actions);
    }

    /// Resolve the player's answer. When the battle goes on, the returned
    /// ticket must be redeemed with [`Self::resolve_enemy_turn`], after
    /// whatever presentation delay the caller wants.
    pub fn resolve_player_turn(&mut self, raw: &str) -> Option<PlayerTurn> {
        let resolution = self.battle.submit_answer(raw, &mut self.performance)?;
        let enemy_turn = resolution.awaits_enemy().then(|| EnemyTurnTicket {
            epoch: self.battle.epoch(),
            delay: self.settings.enemy_turn_delay,
        });
        Some(PlayerTurn {
            resolution,
            enemy_turn,
        })
    }

    pub fn resolve_enemy_turn(&mut self, ticket: EnemyTurnTicket) -> Option<EnemyStrike> {
        if ticket.epoch != self.battle.epoch() {
            debug!(ticket = ticket.epoch, current = self.battle.epoch(), "stale enemy turn dropped");
            return None;
        }
        if self.battle.phase() != BattlePhase::Playing || self.battle.turn() != Turn::Enemy {
            trace!(phase = self.battle.phase().as_str(), "enemy turn not pending");
            return None;
        }
        let damage = roll_enemy_damage(self.battle.multiplier(), &mut self.rng);
        let terminal = self.battle.enemy_attack(damage);
        if terminal.is_none() {
            self.refresh_actions();
        }
        Some(EnemyStrike { damage, terminal })
    }

    pub fn metrics(&self) -> BattleMetrics {
        BattleMetrics::collect(&self.battle, self.settings.max_turns)
    }

    /// Submit the current terminal outcome through `reporter`. Resolves to
    /// `Ok(None)` when the battle is not over or was already reported. The
    /// future does not borrow the session, so a reset may happen while the
    /// submission is in flight.
    pub fn report_outcome<'r, B: ResultBackend>(
        &self,
        reporter: &'r ResultReporter<B>,
    ) -> impl Future<Output = Result<Option<OutcomeReport>, BackendError>> + use<'r, B> {
        let pending = self.battle.outcome().map(|outcome| {
            reporter.report_outcome(self.battle.guard(), outcome, &self.metrics())
        });
        async move {
            match pending {
                Some(report) => report.await,
                None => Ok(None),
            }
        }
    }

    /// Abandon the battle: back to `idle` with a fresh performance map.
    pub fn reset(&mut self) {
        self.battle.reset();
        self.performance.clear();
    }

    /// Pick a new hero/location/enemy, keeping word performance.
    pub fn reset_selection(&mut self) -> bool {
        self.battle.reset_selection()
    }
}
