//! Rotation scheduler: owns the timer, the history and the current state.
//!
//! Every method takes `&mut self` and awaits its rotation to completion, so
//! the single owner (the control loop) serializes timer ticks, forced
//! rotations and state changes without any locking.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use wallshuf_common::error::{ConfigError, ErrorReporting, RotationError};
use wallshuf_common::{
    format_duration, select_image, select_repeat, CandidateSource, ExhaustionPolicy,
    HistoryTracker, Notifier, RotationConfig, WallpaperSetter, WallshufError, NOTIFICATION_TITLE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
    Paused,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Stopped => write!(f, "stopped"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub history: Vec<PathBuf>,
    pub interval: Option<Duration>,
    pub timer_armed: bool,
}

impl std::fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rotation {}", self.state)?;
        if let Some(interval) = self.interval {
            write!(f, " every {}", format_duration(interval))?;
        }
        if !self.timer_armed {
            write!(f, ", timer off")?;
        }

        let recent: Vec<_> = self
            .history
            .iter()
            .map(|path| path.file_name().unwrap_or(path.as_os_str()).to_string_lossy())
            .collect();
        write!(f, ", recent [{}]", recent.join(", "))
    }
}

#[derive(Debug)]
pub struct Scheduler<C, W, N, R> {
    source: C,
    setter: W,
    notifier: N,
    rng: R,
    config: Option<RotationConfig>,
    state: SchedulerState,
    history: HistoryTracker,
    timer: Option<Interval>,
}

impl<C, W, N, R> Scheduler<C, W, N, R>
where
    C: CandidateSource,
    W: WallpaperSetter,
    N: Notifier,
    R: Rng,
{
    pub fn new(source: C, setter: W, notifier: N, rng: R) -> Self {
        Self {
            source,
            setter,
            notifier,
            rng,
            config: None,
            state: SchedulerState::Stopped,
            history: HistoryTracker::default(),
            timer: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            state: self.state,
            history: self.history.to_vec(),
            interval: self.config.as_ref().map(|config| config.interval),
            timer_armed: self.timer.is_some(),
        }
    }

    /// Validate `config`, rotate once and arm the timer.
    ///
    /// Fails without leaving `Stopped` if the config is invalid or the first
    /// rotation fails; the caller must not report readiness in that case.
    pub async fn start(&mut self, config: RotationConfig) -> Result<PathBuf, WallshufError> {
        if self.state != SchedulerState::Stopped {
            return Err(ConfigError::InvalidStartParameters {
                message: format!("scheduler already {}", self.state),
            }
            .into());
        }

        config.validate()?;
        log::info!(
            "Starting rotation of {:?} every {:?} (history {}, on exhausted: {}, backend: {})",
            config.pattern,
            config.interval,
            config.history_size,
            config.on_exhausted,
            config.backend
        );

        self.history = HistoryTracker::new(config.history_size);
        self.config = Some(config);

        let first = match self.rotate().await {
            Ok(path) => path,
            Err(e) => {
                self.config = None;
                return Err(e.into());
            }
        };

        self.arm_timer();
        self.state = SchedulerState::Running;
        self.notify("Started!").await;
        Ok(first)
    }

    /// Timer callback. Failures are logged and the timer keeps running.
    pub async fn on_tick(&mut self) -> Option<PathBuf> {
        if self.state != SchedulerState::Running {
            return None;
        }
        self.rotate_logged("Skipping scheduled rotation").await
    }

    /// Cancel the timer. Returns false when there was nothing to pause.
    pub async fn pause(&mut self) -> bool {
        if self.state != SchedulerState::Running {
            log::debug!("Pause ignored while {}", self.state);
            return false;
        }

        self.timer = None;
        self.state = SchedulerState::Paused;
        log::info!("Rotation paused");
        self.notify("Paused!").await;
        true
    }

    /// Rotate immediately and re-arm the timer. Returns false unless paused.
    pub async fn resume(&mut self) -> bool {
        if self.state != SchedulerState::Paused {
            log::debug!("Resume ignored while {}", self.state);
            return false;
        }

        self.rotate_logged("Rotation on resume failed").await;
        self.arm_timer();
        self.state = SchedulerState::Running;
        log::info!("Rotation resumed");
        self.notify("Unpaused!").await;
        true
    }

    /// One out-of-band rotation. The timer phase is left untouched.
    pub async fn force_rotate(&mut self) -> Option<PathBuf> {
        if self.state == SchedulerState::Stopped {
            log::debug!("Forced rotation ignored while stopped");
            return None;
        }
        self.rotate_logged("Forced rotation failed").await
    }

    pub async fn shutdown(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }

        self.timer = None;
        self.state = SchedulerState::Stopped;
        log::info!("Rotation stopped");
        self.notify("Stopped!").await;
        self.notifier.close();
    }

    /// Resolves on the next timer tick; never resolves while no timer is armed.
    pub async fn next_tick(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Resolve, select, apply and record one wallpaper.
    ///
    /// History is only updated after the backend confirmed the change.
    pub async fn rotate(&mut self) -> Result<PathBuf, RotationError> {
        let (pattern, policy, notify) = match &self.config {
            Some(config) => (config.pattern.clone(), config.on_exhausted, config.notify),
            None => {
                return Err(RotationError::EmptyCandidateSet {
                    pattern: String::new(),
                })
            }
        };

        let candidates = self.source.candidates(&pattern).await?;
        if candidates.is_empty() {
            return Err(RotationError::EmptyCandidateSet { pattern });
        }

        let pick = match select_image(&candidates, &self.history, &mut self.rng) {
            Ok(pick) => pick,
            Err(RotationError::SelectionExhausted { candidates: count })
                if policy == ExhaustionPolicy::Repeat =>
            {
                log::info!(
                    "All {} candidates shown recently, repeating the oldest",
                    count
                );
                select_repeat(&candidates, &self.history)?
            }
            Err(e) => return Err(e),
        };

        self.setter.apply(&pick).await?;
        self.history.record(pick.clone());
        log::info!("Wallpaper set to {:?}", pick);

        if notify {
            let name = pick
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| pick.display().to_string());
            self.notifier
                .notify(NOTIFICATION_TITLE, &format!("Now showing {}", name))
                .await;
        }

        Ok(pick)
    }

    async fn rotate_logged(&mut self, context: &str) -> Option<PathBuf> {
        match self.rotate().await {
            Ok(path) => Some(path),
            Err(e) => {
                e.log_error(context);
                None
            }
        }
    }

    fn arm_timer(&mut self) {
        let Some(period) = self.config.as_ref().map(|config| config.interval) else {
            return;
        };

        // First tick one full period from now; the caller has just rotated.
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
    }

    async fn notify(&self, message: &str) {
        if self.config.as_ref().is_some_and(|config| config.notify) {
            self.notifier.notify(NOTIFICATION_TITLE, message).await;
        }
    }
}
