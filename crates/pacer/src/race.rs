//! Async race runner.
//!
//! One task owns the [`Simulation`] and drives it from two intervals: a fast
//! animation tick and a slow sample tick. Readers get immutable views over a
//! watch channel; the only way to touch the state is through commands.

use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::coach::CoachingService;
use crate::config::SimulationConfig;
use crate::dispatcher::TelemetryDispatcher;
use crate::errors::{AskError, ConfigError};
use crate::history::SampleHistory;
use crate::models::{Advice, AdviceState, MetricsSnapshot, RaceSummary, TelemetryTick, Waypoint};
use crate::route::Route;
use crate::sampler::NoiseSource;
use crate::simulation::{AnimationOutcome, Simulation};
use crate::splits::KmSplitSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStatus {
    Running,
    Finished,
    Reset,
}

/// Read-only picture of the race published after every tick.
#[derive(Debug, Clone)]
pub struct RaceView {
    pub race_id: Uuid,
    pub status: RaceStatus,
    pub position: Waypoint,
    pub segment_index: usize,
    pub fraction: f64,
    pub snapshot: MetricsSnapshot,
    pub history: Arc<SampleHistory>,
    pub splits: Arc<Vec<KmSplitSummary>>,
}

/// Read capability shared by every presentation layer.
pub trait SnapshotSource {
    fn snapshot(&self) -> MetricsSnapshot;
    fn history(&self) -> Arc<SampleHistory>;
}

enum Command {
    Snapshot(oneshot::Sender<MetricsSnapshot>),
    Reset,
}

/// What the loop hands back when it stops.
struct LoopExit {
    summary: RaceSummary,
    views: watch::Sender<RaceView>,
}

pub struct Race;

impl Race {
    /// Starts both timers and returns a handle to the running race.
    /// Must be called from within a tokio runtime.
    pub fn start(
        route: Route,
        config: SimulationConfig,
        coach: Arc<dyn CoachingService>,
        noise: Box<dyn NoiseSource>,
    ) -> Result<RaceHandle, ConfigError> {
        config.validate()?;
        let race_id = Uuid::new_v4();
        let sim = Simulation::new(Arc::new(route), config, noise);
        let dispatcher = TelemetryDispatcher::new(coach);

        let initial = RaceView {
            race_id,
            status: RaceStatus::Running,
            position: sim.state().position,
            segment_index: 0,
            fraction: 0.0,
            snapshot: sim.snapshot(),
            history: Arc::new(sim.history().clone()),
            splits: Arc::new(Vec::new()),
        };
        let (view_tx, view_rx) = watch::channel(initial);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        info!(
            "Starting race {race_id}: {:.2} km over {} micro-segments",
            sim.route().total_distance_m() / 1000.0,
            sim.route().segment_count()
        );

        let task = tokio::spawn(run_loop(race_id, sim, dispatcher.clone(), cmd_rx, view_tx));

        Ok(RaceHandle {
            race_id,
            commands: cmd_tx,
            views: view_rx,
            dispatcher,
            task: Mutex::new(Some(task)),
        })
    }
}

pub struct RaceHandle {
    race_id: Uuid,
    commands: mpsc::Sender<Command>,
    views: watch::Receiver<RaceView>,
    dispatcher: TelemetryDispatcher,
    task: Mutex<Option<JoinHandle<LoopExit>>>,
}

impl RaceHandle {
    pub fn race_id(&self) -> Uuid {
        self.race_id
    }

    pub fn view(&self) -> RaceView {
        self.views.borrow().clone()
    }

    pub fn status(&self) -> RaceStatus {
        self.views.borrow().status
    }

    pub fn subscribe(&self) -> watch::Receiver<RaceView> {
        self.views.clone()
    }

    pub fn splits(&self) -> Arc<Vec<KmSplitSummary>> {
        self.views.borrow().splits.clone()
    }

    pub fn advice(&self) -> AdviceState {
        self.dispatcher.advice()
    }

    pub fn subscribe_advice(&self) -> watch::Receiver<AdviceState> {
        self.dispatcher.subscribe()
    }

    /// Asks the coach now. The snapshot is taken fresh from the race loop;
    /// the network round trip happens outside it.
    pub async fn ask(&self) -> Result<Advice, AskError> {
        let snapshot = match self.fresh_snapshot().await {
            Some(snapshot) => snapshot,
            None => {
                let view = self.views.borrow().clone();
                if view.status == RaceStatus::Reset {
                    return Err(AskError::RaceGone);
                }
                view.snapshot
            }
        };

        let tick = TelemetryTick::from_snapshot(self.race_id, &snapshot);
        Ok(self.dispatcher.ask(&tick).await?)
    }

    /// Stops both timers, clears the advice and notifies the coach.
    /// Calling it again, or after the race finished, is harmless.
    ///
    /// Returns the in-flight end-of-race notification on the first call.
    /// Reset itself never waits for it.
    pub async fn reset(&self) -> Option<JoinHandle<()>> {
        let task = self.task.lock().ok().and_then(|mut guard| guard.take());
        let Some(task) = task else {
            debug!("Race {} already reset", self.race_id);
            return None;
        };

        // The loop may already have exited on its own
        let _ = self.commands.send(Command::Reset).await;
        let exit = match task.await {
            Ok(exit) => {
                exit.views.send_modify(|v| v.status = RaceStatus::Reset);
                Some(exit)
            }
            Err(e) => {
                error!("Race loop ended abnormally: {e}");
                None
            }
        };

        let notification = if self.dispatcher.close()
            && let Some(exit) = exit
        {
            Some(self.dispatcher.notify_end(exit.summary))
        } else {
            None
        };
        info!("Race {} reset", self.race_id);
        notification
    }

    /// Resolves once the race has finished or been reset.
    pub async fn finished(&self) -> RaceStatus {
        let mut views = self.views.clone();
        let result = views
            .wait_for(|v| v.status != RaceStatus::Running)
            .await
            .map(|v| v.status);
        match result {
            Ok(status) => status,
            // Sender dropped: the loop is gone
            Err(_) => self.views.borrow().status,
        }
    }

    async fn fresh_snapshot(&self) -> Option<MetricsSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Snapshot(tx)).await.ok()?;
        rx.await.ok()
    }
}

impl SnapshotSource for RaceHandle {
    fn snapshot(&self) -> MetricsSnapshot {
        self.views.borrow().snapshot.clone()
    }

    fn history(&self) -> Arc<SampleHistory> {
        self.views.borrow().history.clone()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

async fn run_loop(
    race_id: Uuid,
    mut sim: Simulation,
    dispatcher: TelemetryDispatcher,
    mut commands: mpsc::Receiver<Command>,
    views: watch::Sender<RaceView>,
) -> LoopExit {
    let start = Instant::now();
    let mut animation = interval(sim.config().animation_period());
    animation.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let sample_period = sim.config().sample_period();
    let mut sampling = interval_at(start + sample_period, sample_period);
    sampling.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut history = Arc::new(sim.history().clone());
    let mut splits = Arc::new(Vec::new());

    loop {
        tokio::select! {
            biased;

            cmd = commands.recv() => match cmd {
                Some(Command::Snapshot(reply)) => {
                    let _ = reply.send(sim.snapshot());
                }
                Some(Command::Reset) | None => break,
            },

            _ = animation.tick() => {
                let outcome = sim.on_animation_tick(elapsed_ms(start));
                let finished = outcome == AnimationOutcome::JustFinished;
                publish(&views, race_id, &sim, &history, &splits, finished);
                if finished {
                    break;
                }
            }

            _ = sampling.tick() => {
                if let Some(snapshot) = sim.on_sample_tick(elapsed_ms(start)) {
                    history = Arc::new(sim.history().clone());
                    splits = Arc::new(sim.splits());
                    publish(&views, race_id, &sim, &history, &splits, false);
                    dispatcher.dispatch_periodic(TelemetryTick::from_snapshot(race_id, &snapshot));
                }
            }
        }
    }

    // Both intervals are dropped with this frame
    let summary = RaceSummary {
        race_id,
        finished: sim.is_finished(),
        elapsed_ms: sim.state().elapsed_ms,
        done_km: sim.snapshot().done_km,
        splits: sim.splits(),
        ended_at: OffsetDateTime::now_utc().unix_timestamp(),
    };
    LoopExit { summary, views }
}

fn publish(
    views: &watch::Sender<RaceView>,
    race_id: Uuid,
    sim: &Simulation,
    history: &Arc<SampleHistory>,
    splits: &Arc<Vec<KmSplitSummary>>,
    finished: bool,
) {
    let state = sim.state();
    views.send_replace(RaceView {
        race_id,
        status: if finished {
            RaceStatus::Finished
        } else {
            RaceStatus::Running
        },
        position: state.position,
        segment_index: state.segment_index,
        fraction: state.fraction,
        snapshot: sim.snapshot(),
        history: history.clone(),
        splits: splits.clone(),
    });
}
