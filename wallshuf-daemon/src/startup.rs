//! Turns the launcher's start message into a running scheduler and answers
//! with exactly one status line.

use std::io::{self, Write};

use rand::Rng;

use wallshuf_common::error::HandshakeError;
use wallshuf_common::handshake::write_message;
use wallshuf_common::{
    CandidateSource, ErrorReporting, Notifier, RotationConfig, StartMessage, StatusMessage,
    WallpaperSetter, WallshufError,
};

use crate::scheduler::Scheduler;

/// Validate `received`, build a scheduler with `build` and start it.
///
/// The ready or failed status is written to `out` before returning; on `Err`
/// the caller should exit non-zero.
pub async fn start_scheduler<C, W, N, R, B, O>(
    received: Result<StartMessage, HandshakeError>,
    build: B,
    out: &mut O,
) -> Result<Scheduler<C, W, N, R>, WallshufError>
where
    C: CandidateSource,
    W: WallpaperSetter,
    N: Notifier,
    R: Rng,
    B: FnOnce(&RotationConfig) -> Scheduler<C, W, N, R>,
    O: Write,
{
    let config = match received
        .map_err(WallshufError::from)
        .and_then(|message| RotationConfig::try_from(message).map_err(WallshufError::from))
    {
        Ok(config) => config,
        Err(e) => {
            e.log_error("Rejected start message");
            report(out, &StatusMessage::failed(e.user_friendly_message()));
            return Err(e);
        }
    };

    let mut scheduler = build(&config);
    match scheduler.start(config).await {
        Ok(first) => {
            log::info!("First wallpaper {:?}, daemon ready", first);
            report(out, &StatusMessage::ready());
            Ok(scheduler)
        }
        Err(e) => {
            e.log_error("Failed to start rotation");
            report(out, &StatusMessage::failed(e.user_friendly_message()));
            Err(e)
        }
    }
}

/// Answer the launcher. It may already be gone, which is not fatal.
pub fn report<O: Write>(out: &mut O, status: &StatusMessage) {
    if let Err(e) = write_message(out, status) {
        match e {
            HandshakeError::Write(ref source) if source.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("Launcher closed the status pipe");
            }
            _ => log::warn!("Failed to report status {:?}: {}", status, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::tests::{scheduler_with, FakeNotifier, FakeSetter, FakeSource};
    use crate::scheduler::SchedulerState;
    use std::io::Cursor;
    use wallshuf_common::handshake::read_message;

    fn received(line: &str) -> Result<StartMessage, HandshakeError> {
        read_message(&mut Cursor::new(line.as_bytes().to_vec()))
    }

    fn status_line(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_first_rotation() {
        let source = FakeSource::with(&["/wp/a.png", "/wp/b.png"]);
        let setter = FakeSetter::default();
        let notifier = FakeNotifier::default();
        let mut out = Vec::new();

        let scheduler = start_scheduler(
            received("{\"pattern\":\"/wp/*.png\",\"intervalMillis\":1000}\n"),
            |_| scheduler_with(&source, &setter, &notifier),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(status_line(out), "{\"running\":true}\n");
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(setter.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pattern_reports_failure() {
        let source = FakeSource::default();
        let setter = FakeSetter::default();
        let notifier = FakeNotifier::default();
        let mut out = Vec::new();

        let result = start_scheduler(
            received("{\"pattern\":\"/empty/*.png\",\"intervalMillis\":5000}\n"),
            |_| scheduler_with(&source, &setter, &notifier),
            &mut out,
        )
        .await;

        assert!(matches!(result, Err(WallshufError::Rotation(_))));
        assert_eq!(
            status_line(out),
            "{\"running\":false,\"error\":\"No wallpapers found!\"}\n"
        );
        assert_eq!(setter.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_interval_reports_failure_without_building() {
        let mut out = Vec::new();
        let mut built = false;

        let result = start_scheduler(
            received("{\"pattern\":\"/wp/*.png\",\"intervalMillis\":-5}\n"),
            |_| {
                built = true;
                scheduler_with(
                    &FakeSource::default(),
                    &FakeSetter::default(),
                    &FakeNotifier::default(),
                )
            },
            &mut out,
        )
        .await;

        assert!(result.unwrap_err().is_invalid_start());
        assert!(!built);

        let status: StatusMessage = serde_json::from_str(&status_line(out)).unwrap();
        assert!(!status.running);
        assert!(status.error.unwrap().contains("intervalMillis must be positive"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_and_malformed_input_report_failure() {
        for (input, expected) in [
            ("", "Handshake channel closed before a message arrived"),
            ("{\"pattern\": 12}\n", "Malformed handshake message"),
        ] {
            let mut out = Vec::new();
            let result = start_scheduler(
                received(input),
                |_| {
                    scheduler_with(
                        &FakeSource::default(),
                        &FakeSetter::default(),
                        &FakeNotifier::default(),
                    )
                },
                &mut out,
            )
            .await;

            assert!(matches!(result, Err(WallshufError::Handshake(_))));
            let status: StatusMessage = serde_json::from_str(&status_line(out)).unwrap();
            assert!(!status.running);
            assert!(status.error.unwrap().contains(expected));
        }
    }

    #[test]
    fn test_report_to_closed_pipe_is_not_fatal() {
        struct ClosedPipe;

        impl Write for ClosedPipe {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        report(&mut ClosedPipe, &StatusMessage::ready());
    }
}
