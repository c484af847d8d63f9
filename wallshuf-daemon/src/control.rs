//! Translates Unix signals into scheduler commands and drives the main loop.

use std::future::Future;

use anyhow::{Context, Result};
use rand::Rng;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use wallshuf_common::{CandidateSource, ControlSignal, Notifier, WallpaperSetter};

use crate::scheduler::{Scheduler, SchedulerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Next,
    Terminate,
}

impl From<ControlSignal> for Command {
    fn from(signal: ControlSignal) -> Self {
        match signal {
            ControlSignal::TogglePause => Command::TogglePause,
            ControlSignal::Next => Command::Next,
            ControlSignal::Terminate => Command::Terminate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Install handlers for the control signals and forward them into `tx`.
///
/// Must run before anything slow so that an early SIGUSR1 does not take
/// the default action and kill the process.
pub fn spawn_signal_listeners(tx: mpsc::Sender<Command>) -> Result<()> {
    let bindings = [
        (SignalKind::user_defined1(), "SIGUSR1", Command::TogglePause),
        (SignalKind::user_defined2(), "SIGUSR2", Command::Next),
        (SignalKind::terminate(), "SIGTERM", Command::Terminate),
        (SignalKind::interrupt(), "SIGINT", Command::Terminate),
        (SignalKind::hangup(), "SIGHUP", Command::Terminate),
    ];

    for (kind, name, command) in bindings {
        let mut stream =
            signal(kind).with_context(|| format!("Failed to install {} handler", name))?;
        let tx = tx.clone();

        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                log::debug!("Received {}", name);
                if tx.send(command).await.is_err() {
                    break;
                }
            }
        });
    }

    Ok(())
}

/// Wait for `start` to finish while answering commands as a stopped daemon.
///
/// Returns `None` when a terminate request arrives first.
pub async fn await_start<F, T>(rx: &mut mpsc::Receiver<Command>, start: F) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::pin!(start);

    loop {
        tokio::select! {
            value = &mut start => return Some(value),
            command = rx.recv() => match command {
                Some(Command::Terminate) => {
                    log::info!("Terminated before rotation started");
                    return None;
                }
                Some(other) => log::debug!("Ignoring {:?}: rotation not started", other),
                None => return Some(start.await),
            },
        }
    }
}

pub async fn dispatch<C, W, N, R>(scheduler: &mut Scheduler<C, W, N, R>, command: Command) -> Flow
where
    C: CandidateSource,
    W: WallpaperSetter,
    N: Notifier,
    R: Rng,
{
    match command {
        Command::TogglePause => {
            match scheduler.state() {
                SchedulerState::Running => {
                    scheduler.pause().await;
                }
                SchedulerState::Paused => {
                    scheduler.resume().await;
                }
                SchedulerState::Stopped => log::debug!("Toggle ignored while stopped"),
            }
            log::info!("{}", scheduler.status());
            Flow::Continue
        }
        Command::Next => {
            scheduler.force_rotate().await;
            Flow::Continue
        }
        Command::Terminate => {
            scheduler.shutdown().await;
            log::info!("{}", scheduler.status());
            Flow::Exit
        }
    }
}

/// Serve timer ticks and commands until shutdown.
pub async fn run<C, W, N, R>(scheduler: &mut Scheduler<C, W, N, R>, mut rx: mpsc::Receiver<Command>)
where
    C: CandidateSource,
    W: WallpaperSetter,
    N: Notifier,
    R: Rng,
{
    loop {
        tokio::select! {
            _ = scheduler.next_tick() => {
                scheduler.on_tick().await;
            }
            command = rx.recv() => {
                let flow = match command {
                    Some(command) => dispatch(scheduler, command).await,
                    None => {
                        log::warn!("Control channel closed, shutting down");
                        scheduler.shutdown().await;
                        Flow::Exit
                    }
                };
                if flow == Flow::Exit {
                    break;
                }
            }
        }
    }

    log::info!("Control loop finished");
}
