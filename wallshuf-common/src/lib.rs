pub mod candidates;
pub mod duration;
pub mod error;
pub mod handshake;
pub mod history;
pub mod image;
pub mod notify;
pub mod pidfile;
pub mod selector;
pub mod signal;
pub mod wallpaper;

pub use candidates::{image_pattern, resolve_candidates, CandidateSource, GlobSource, DEFAULT_GLOB};
pub use duration::{format_duration, parse_duration};
pub use error::{ErrorReporting, Result, RotationError, WallshufError};
pub use handshake::{RotationConfig, StartMessage, StatusMessage};
pub use history::{HistoryTracker, DEFAULT_HISTORY_SIZE, MAX_HISTORY_SIZE};
pub use notify::{DesktopNotifier, Notifier, NOTIFICATION_TITLE};
pub use pidfile::ProcessInfo;
pub use selector::{select_image, select_repeat, ExhaustionPolicy};
pub use signal::ControlSignal;
pub use wallpaper::{Backend, BackendSetter, WallpaperSetter};
