use std::path::PathBuf;

use tokio::process::Command;

pub const NOTIFICATION_TITLE: &str = "Wallpaper Shuffle";

/// Best-effort user notifications. Delivery failures never reach the caller.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, title: &str, message: &str);

    /// Release any open notification handles before exit.
    fn close(&self) {}
}

/// Sends notifications through `notify-send` when it is installed.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    binary: Option<PathBuf>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        let binary = which::which("notify-send").ok();
        if binary.is_none() {
            log::debug!("notify-send not found, desktop notifications disabled");
        }
        Self { binary }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) {
        let Some(binary) = &self.binary else {
            return;
        };

        let result = Command::new(binary)
            .args(["--app-name=wallshuf", title, message])
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                log::debug!("Notification sent: {} - {}", title, message);
            }
            Ok(output) => {
                log::debug!(
                    "notify-send exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => log::debug!("Failed to run notify-send: {}", e),
        }
    }
}
