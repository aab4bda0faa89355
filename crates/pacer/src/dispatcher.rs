//! Sends telemetry to the coaching service and tracks the advice on display.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::coach::{Channel, CoachingService};
use crate::errors::CoachError;
use crate::models::{Advice, AdviceState, RaceSummary, TelemetryTick};

struct Inner {
    coach: Arc<dyn CoachingService>,
    advice: watch::Sender<AdviceState>,
    closed: AtomicBool,
}

#[derive(Clone)]
pub struct TelemetryDispatcher {
    inner: Arc<Inner>,
}

impl TelemetryDispatcher {
    pub fn new(coach: Arc<dyn CoachingService>) -> Self {
        let (advice, _) = watch::channel(AdviceState::Idle);
        Self {
            inner: Arc::new(Inner {
                coach,
                advice,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn advice(&self) -> AdviceState {
        self.inner.advice.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AdviceState> {
        self.inner.advice.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Sends a tick in the background. Failures are logged and dropped.
    pub fn dispatch_periodic(&self, tick: TelemetryTick) -> tokio::task::JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            match dispatcher
                .inner
                .coach
                .advise(Channel::Periodic, &tick)
                .await
            {
                Ok(advice) => dispatcher.apply(advice),
                Err(e) => warn!("Periodic tick at {:.2} km failed: {e}", tick.done_km),
            }
        })
    }

    /// Sends a tick and waits for the reply. Failures go back to the caller.
    pub async fn ask(&self, tick: &TelemetryTick) -> Result<Advice, CoachError> {
        let advice = self.inner.coach.advise(Channel::OnDemand, tick).await?;
        self.apply(advice.clone());
        Ok(advice)
    }

    /// Returns the display to `Idle` and ignores replies still in flight.
    /// Returns `false` if the dispatcher was already closed.
    pub fn close(&self) -> bool {
        let first = !self.inner.closed.swap(true, Ordering::AcqRel);
        self.inner.advice.send_replace(AdviceState::Idle);
        first
    }

    /// Fires the end-of-race notification without waiting for it.
    pub fn notify_end(&self, summary: RaceSummary) -> tokio::task::JoinHandle<()> {
        let coach = self.inner.coach.clone();
        tokio::spawn(async move {
            match coach.end_of_race(&summary).await {
                Ok(()) => info!("End-of-race notification sent for {}", summary.race_id),
                Err(e) => warn!("End-of-race notification failed: {e}"),
            }
        })
    }

    fn apply(&self, advice: Advice) {
        if self.is_closed() {
            debug!("Dropping advice received after reset");
            return;
        }
        match advice {
            Advice::Tip(text) => {
                info!("New advice: {text}");
                self.inner.advice.send_replace(AdviceState::Showing(text));
            }
            Advice::NoTip => debug!("Coach has nothing to say"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Replies with queued results, recording every call.
    #[derive(Default)]
    struct FakeCoach {
        replies: Mutex<Vec<Result<Advice, CoachError>>>,
        calls: Mutex<Vec<Channel>>,
        ended: Mutex<usize>,
    }

    impl FakeCoach {
        fn with(replies: Vec<Result<Advice, CoachError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl CoachingService for FakeCoach {
        async fn advise(
            &self,
            channel: Channel,
            _tick: &TelemetryTick,
        ) -> Result<Advice, CoachError> {
            self.calls.lock().unwrap().push(channel);
            self.replies.lock().unwrap().pop().unwrap_or(Ok(Advice::NoTip))
        }

        async fn end_of_race(&self, _summary: &RaceSummary) -> Result<(), CoachError> {
            *self.ended.lock().unwrap() += 1;
            Err(CoachError::Malformed("down".into()))
        }
    }

    fn tick() -> TelemetryTick {
        TelemetryTick {
            race_id: Uuid::nil(),
            done_km: 1.0,
            remain_km: 4.0,
            pace_now: 5.1,
            next_change_km: 1.0,
            pace_obj: 5.0,
            pace_avg: 5.0,
            pace_gap: 0.1,
            time_next_change_min: 5.1,
            time_next_change_obj_min: 5.0,
            time_run_min: 5.0,
            eta_gap_min: 0.1,
            pace_cv: 0.01,
            heart_rate: 140,
            hr_avg: 138.0,
        }
    }

    fn http_error() -> CoachError {
        CoachError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".into(),
        }
    }

    #[tokio::test]
    async fn test_periodic_tip_then_no_tip_keeps_advice() {
        let coach = FakeCoach::with(vec![Ok(Advice::Tip("Relax your shoulders".into())), Ok(Advice::NoTip)]);
        let dispatcher = TelemetryDispatcher::new(coach.clone());
        assert_eq!(dispatcher.advice(), AdviceState::Idle);

        dispatcher.dispatch_periodic(tick()).await.unwrap();
        assert_eq!(dispatcher.advice(), AdviceState::Showing("Relax your shoulders".into()));

        dispatcher.dispatch_periodic(tick()).await.unwrap();
        assert_eq!(dispatcher.advice(), AdviceState::Showing("Relax your shoulders".into()));

        assert_eq!(*coach.calls.lock().unwrap(), vec![Channel::Periodic, Channel::Periodic]);
    }

    #[tokio::test]
    async fn test_periodic_failure_is_swallowed() {
        let coach = FakeCoach::with(vec![Err(http_error())]);
        let dispatcher = TelemetryDispatcher::new(coach);

        // The spawned task completes without panicking
        dispatcher.dispatch_periodic(tick()).await.unwrap();
        assert_eq!(dispatcher.advice(), AdviceState::Idle);
    }

    #[tokio::test]
    async fn test_ask_propagates_failure() {
        let coach = FakeCoach::with(vec![Err(http_error())]);
        let dispatcher = TelemetryDispatcher::new(coach.clone());

        let err = dispatcher.ask(&tick()).await.unwrap_err();
        assert!(matches!(err, CoachError::Status { .. }));
        assert_eq!(dispatcher.advice(), AdviceState::Idle);
        assert_eq!(*coach.calls.lock().unwrap(), vec![Channel::OnDemand]);
    }

    #[tokio::test]
    async fn test_ask_returns_tip_and_updates_display() {
        let coach = FakeCoach::with(vec![Ok(Advice::Tip("Push now".into()))]);
        let dispatcher = TelemetryDispatcher::new(coach);
        let mut rx = dispatcher.subscribe();

        let advice = dispatcher.ask(&tick()).await.unwrap();
        assert_eq!(advice, Advice::Tip("Push now".into()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AdviceState::Showing("Push now".into()));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_drops_late_replies() {
        let coach = FakeCoach::with(vec![
            Ok(Advice::Tip("First".into())),
            Ok(Advice::Tip("Too late".into())),
        ]);
        let dispatcher = TelemetryDispatcher::new(coach);

        dispatcher.dispatch_periodic(tick()).await.unwrap();
        assert_eq!(dispatcher.advice(), AdviceState::Showing("First".into()));

        assert!(dispatcher.close());
        assert!(!dispatcher.close());
        assert_eq!(dispatcher.advice(), AdviceState::Idle);

        dispatcher.dispatch_periodic(tick()).await.unwrap();
        assert_eq!(dispatcher.advice(), AdviceState::Idle);
    }

    #[tokio::test]
    async fn test_end_of_race_failure_is_logged_only() {
        let coach = FakeCoach::with(vec![]);
        let dispatcher = TelemetryDispatcher::new(coach.clone());
        let summary = RaceSummary {
            race_id: Uuid::nil(),
            finished: false,
            elapsed_ms: 1000,
            done_km: 0.2,
            splits: vec![],
            ended_at: 0,
        };

        dispatcher.notify_end(summary).await.unwrap();
        assert_eq!(*coach.ended.lock().unwrap(), 1);
    }
}
