use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use vocab_battle::backend::{BackendError, ResultBackend};
use vocab_battle::catalog::Catalog;
use vocab_battle::session::battle::BattleOutcome;
use vocab_battle::session::{
    BattleSession, ResultReporter, ResultSubmission, SessionSettings, SubmissionReceipt,
};
use vocab_battle::store::json_store::JsonStore;
use vocab_battle::vocabulary::VocabularyItem;

struct CountingBackend {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingBackend {
    fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultBackend for CountingBackend {
    async fn submit(&self, submission: &ResultSubmission) -> Result<SubmissionReceipt, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail {
            Err(BackendError::Status(503))
        } else {
            Ok(SubmissionReceipt {
                xp_earned: submission.xp,
            })
        }
    }
}

/// Session with a one-word pool, played to victory.
fn finished_session() -> BattleSession {
    let mut session = BattleSession::new(
        SessionSettings::default(),
        Arc::new(Catalog::builtin()),
        vec![VocabularyItem::new("gato", "cat")],
        SmallRng::seed_from_u64(11),
    );
    session.start_selection();
    session.select_hero("knight");
    session.select_location("forest");
    session.select_enemy("slime");
    session.begin_battle().unwrap();
    while session.battle().outcome().is_none() {
        let turn = session.resolve_player_turn("cat").unwrap();
        if let Some(ticket) = turn.enemy_turn {
            session.resolve_enemy_turn(ticket);
        }
    }
    session
}

#[tokio::test]
async fn scenario_e_concurrent_reports_submit_once() {
    let session = finished_session();
    let reporter = ResultReporter::new(CountingBackend::new(false));

    let (first, second) = tokio::join!(
        session.report_outcome(&reporter),
        session.report_outcome(&reporter)
    );

    assert_eq!(reporter.backend().calls(), 1);
    let reports: Vec<_> = [first.unwrap(), second.unwrap()].into_iter().flatten().collect();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].xp_earned, session.metrics().xp());
    assert!((reports[0].accuracy - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn report_after_completion_is_noop() {
    let session = finished_session();
    let reporter = ResultReporter::new(CountingBackend::new(false));

    assert!(session.report_outcome(&reporter).await.unwrap().is_some());
    assert!(session.report_outcome(&reporter).await.unwrap().is_none());
    assert_eq!(reporter.backend().calls(), 1);
}

#[tokio::test]
async fn failed_submission_is_not_retried() {
    let session = finished_session();
    let reporter = ResultReporter::new(CountingBackend::new(true));

    let first = session.report_outcome(&reporter).await;
    assert!(matches!(first, Err(BackendError::Status(503))));
    assert!(session.battle().guard().is_claimed());

    let second = session.report_outcome(&reporter).await;
    assert!(matches!(second, Ok(None)));
    assert_eq!(reporter.backend().calls(), 1);
}

#[tokio::test]
async fn unfinished_battle_reports_nothing() {
    let mut session = finished_session();
    session.reset();
    let reporter = ResultReporter::new(CountingBackend::new(false));
    assert!(session.report_outcome(&reporter).await.unwrap().is_none());
    assert_eq!(reporter.backend().calls(), 0);
    assert!(!session.battle().guard().is_claimed());
}

#[tokio::test]
async fn guard_is_claimed_before_the_future_is_polled() {
    let session = finished_session();
    let reporter = ResultReporter::new(CountingBackend::new(false));

    let pending = session.report_outcome(&reporter);
    assert!(session.battle().guard().is_claimed());
    drop(pending);

    assert!(session.report_outcome(&reporter).await.unwrap().is_none());
    assert_eq!(reporter.backend().calls(), 0);
}

#[tokio::test]
async fn new_battle_gets_a_fresh_guard() {
    let mut session = finished_session();
    let reporter = ResultReporter::new(CountingBackend::new(false));
    session.report_outcome(&reporter).await.unwrap();

    session.reset();
    session.start_selection();
    session.select_hero("mage");
    session.select_location("castle");
    session.select_enemy("slime");
    session.begin_battle().unwrap();
    while session.battle().outcome().is_none() {
        let turn = session.resolve_player_turn("cat").unwrap();
        if let Some(ticket) = turn.enemy_turn {
            session.resolve_enemy_turn(ticket);
        }
    }

    assert!(session.report_outcome(&reporter).await.unwrap().is_some());
    assert_eq!(reporter.backend().calls(), 2);
}

#[tokio::test]
async fn local_store_records_reported_battle() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let reporter = ResultReporter::new(store);
    let session = finished_session();

    let report = session.report_outcome(&reporter).await.unwrap().unwrap();
    let profile = reporter.backend().load_profile();
    assert_eq!(profile.battles, 1);
    assert_eq!(profile.victories, 1);
    assert_eq!(profile.total_xp, u64::from(report.xp_earned));

    let history = reporter.backend().load_history();
    assert_eq!(history.battles[0].outcome, BattleOutcome::Victory);
    assert_eq!(history.battles[0].enemy_id, "slime");
}
