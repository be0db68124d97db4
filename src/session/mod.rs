pub mod battle;
pub mod guard;
pub mod orchestrator;
pub mod result;

pub use battle::{Battle, BattleEvent, BattleOutcome, BattlePhase, Turn};
pub use guard::{OutcomeReport, ResultReporter, SubmissionGuard};
pub use orchestrator::{BattleSession, EnemyTurnTicket, SessionError, SessionSettings};
pub use result::{BattleMetrics, ResultSubmission, SubmissionReceipt};
