use std::io::{self, BufReader};

use anyhow::Context;
use tokio::sync::mpsc;

use wallshuf_common::handshake::read_message;
use wallshuf_common::{DesktopNotifier, GlobSource, StartMessage};
use wallshuf_daemon::{await_start, run, spawn_signal_listeners, start_scheduler, Scheduler};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let code = match serve().await {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{:#}", e);
            1
        }
    };

    // A pending blocking stdin read would otherwise hold up runtime shutdown
    std::process::exit(code);
}

async fn serve() -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel(16);
    spawn_signal_listeners(tx)?;

    log::info!("wallshuf daemon {} waiting for start message", std::process::id());

    let read_start = async {
        tokio::task::spawn_blocking(|| {
            let mut stdin = BufReader::new(io::stdin());
            read_message::<StartMessage, _>(&mut stdin)
        })
        .await
    };

    let Some(received) = await_start(&mut rx, read_start).await else {
        return Ok(());
    };
    let received = received.context("Start message reader panicked")?;

    let mut scheduler = start_scheduler(
        received,
        |config| {
            Scheduler::new(
                GlobSource,
                config.backend.setter(),
                DesktopNotifier::new(),
                rand::thread_rng(),
            )
        },
        &mut io::stdout().lock(),
    )
    .await
    .context("start failed")?;

    run(&mut scheduler, rx).await;
    Ok(())
}
