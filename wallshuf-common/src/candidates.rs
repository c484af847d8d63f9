use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, RotationError};

/// Pattern used when neither the command line nor the config file names one.
pub const DEFAULT_GLOB: &str = "*.{png,jpg,jpeg}";

/// Source of the candidate set for a rotation.
///
/// Implementations must resolve fresh on every call; the scheduler relies on
/// that to pick up files added or removed between rotations.
#[allow(async_fn_in_trait)]
pub trait CandidateSource {
    async fn candidates(&self, pattern: &str) -> Result<Vec<PathBuf>, RotationError>;
}

/// Resolves patterns against the filesystem with the `glob` crate.
#[derive(Debug, Clone, Default)]
pub struct GlobSource;

impl CandidateSource for GlobSource {
    async fn candidates(&self, pattern: &str) -> Result<Vec<PathBuf>, RotationError> {
        let owned = pattern.to_string();
        tokio::task::spawn_blocking(move || resolve_candidates(&owned))
            .await
            .map_err(|e| RotationError::Pattern {
                pattern: pattern.to_string(),
                message: format!("directory scan aborted: {}", e),
            })?
    }
}

/// Join a directory and a file glob into one pattern.
pub fn image_pattern(directory: &Path, glob: &str) -> String {
    directory.join(glob).to_string_lossy().into_owned()
}

/// All regular files matching `pattern`, sorted and deduplicated.
///
/// An empty result is not an error here; callers decide what an empty set means.
pub fn resolve_candidates(pattern: &str) -> Result<Vec<PathBuf>, RotationError> {
    let mut found = BTreeSet::new();

    for expanded in expand_braces(pattern) {
        let entries = glob::glob(&expanded).map_err(|e| RotationError::Pattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;

        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    found.insert(path);
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Skipping unreadable path {:?}: {}", e.path(), e.error());
                }
            }
        }
    }

    log::debug!("Pattern {:?} matched {} files", pattern, found.len());
    Ok(found.into_iter().collect())
}

/// Reject patterns that can never match anything.
pub fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.trim().is_empty() {
        return Err(ConfigError::InvalidStartParameters {
            message: "pattern must not be empty".to_string(),
        });
    }

    for expanded in expand_braces(pattern) {
        glob::Pattern::new(&expanded).map_err(|e| ConfigError::Pattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;
    }

    Ok(())
}

/// Expand `{a,b}` alternations, which the `glob` crate does not support.
///
/// Nested groups are expanded recursively. An unbalanced brace is left as a
/// literal and handed to `glob` unchanged.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0usize;
    let mut close = None;
    let mut splits = Vec::new();
    for (offset, ch) in pattern[open..].char_indices() {
        let index = open + offset;
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(index);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(index),
            _ => {}
        }
    }

    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    let mut alternatives = Vec::new();
    let mut start = open + 1;
    for split in splits.into_iter().chain(std::iter::once(close)) {
        alternatives.push(&pattern[start..split]);
        start = split + 1;
    }

    alternatives
        .into_iter()
        .flat_map(|alternative| expand_braces(&format!("{}{}{}", prefix, alternative, suffix)))
        .collect()
}
