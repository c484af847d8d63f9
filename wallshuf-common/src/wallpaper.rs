use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::RotationError;
use crate::image::validate_image;

/// Applies an image as the desktop background.
#[allow(async_fn_in_trait)]
pub trait WallpaperSetter {
    async fn apply(&self, path: &Path) -> Result<(), RotationError>;
}

/// Which mechanism sets the wallpaper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Platform desktop API through the `wallpaper` crate.
    #[default]
    Native,
    /// `swww img` on Wayland compositors.
    Swww,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Native => write!(f, "native"),
            Backend::Swww => write!(f, "swww"),
        }
    }
}

impl Backend {
    pub fn setter(self) -> BackendSetter {
        match self {
            Backend::Native => BackendSetter::Native(NativeSetter),
            Backend::Swww => BackendSetter::Swww(SwwwSetter),
        }
    }
}

/// Runtime dispatch over the configured backend.
#[derive(Debug, Clone)]
pub enum BackendSetter {
    Native(NativeSetter),
    Swww(SwwwSetter),
}

impl WallpaperSetter for BackendSetter {
    async fn apply(&self, path: &Path) -> Result<(), RotationError> {
        match self {
            BackendSetter::Native(setter) => setter.apply(path).await,
            BackendSetter::Swww(setter) => setter.apply(path).await,
        }
    }
}

fn apply_failure(path: &Path, message: impl Into<String>) -> RotationError {
    RotationError::WallpaperApply {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn check_image(path: &Path) -> Result<(), RotationError> {
    validate_image(path).map_err(|e| apply_failure(path, e.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct NativeSetter;

impl WallpaperSetter for NativeSetter {
    async fn apply(&self, path: &Path) -> Result<(), RotationError> {
        check_image(path)?;

        let path_str = path
            .to_str()
            .ok_or_else(|| apply_failure(path, "path is not valid UTF-8"))?
            .to_string();

        // The platform calls block (gsettings, osascript, registry writes)
        tokio::task::spawn_blocking(move || {
            wallpaper::set_from_path(&path_str).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| apply_failure(path, e.to_string()))?
        .map_err(|message| apply_failure(path, message))?;

        log::info!("Successfully set wallpaper: {:?}", path);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SwwwSetter;

impl SwwwSetter {
    fn command(swww_path: &Path, image_path: &Path) -> Command {
        let mut cmd = Command::new(swww_path);
        cmd.arg("img").arg(image_path);

        // Set environment variables from current session, with fallbacks
        if let Ok(display) = std::env::var("WAYLAND_DISPLAY") {
            cmd.env("WAYLAND_DISPLAY", display);
        } else {
            cmd.env("WAYLAND_DISPLAY", "wayland-0");
        }

        if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
            cmd.env("XDG_RUNTIME_DIR", runtime_dir);
        } else {
            let uid = rustix::process::getuid().as_raw();
            cmd.env("XDG_RUNTIME_DIR", format!("/run/user/{}", uid));
        }

        if std::env::var("XDG_SESSION_TYPE").is_err() {
            cmd.env("XDG_SESSION_TYPE", "wayland");
        }

        cmd
    }
}

impl WallpaperSetter for SwwwSetter {
    async fn apply(&self, path: &Path) -> Result<(), RotationError> {
        check_image(path)?;

        let swww_path =
            which::which("swww").map_err(|_| apply_failure(path, "swww not found in PATH"))?;

        let mut cmd = Self::command(&swww_path, path);
        log::debug!("Executing swww command: {:?}", cmd);

        let output = cmd
            .output()
            .await
            .map_err(|e| apply_failure(path, format!("failed to run swww: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!(
                "swww command failed with exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr
            );
            return Err(apply_failure(path, stderr.trim().to_string()));
        }

        log::info!("Successfully set wallpaper: {:?}", path);
        Ok(())
    }
}
