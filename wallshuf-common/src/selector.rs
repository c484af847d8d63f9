//! Random wallpaper selection that avoids recently shown images.

use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RotationError;
use crate::history::HistoryTracker;

/// What a rotation does when every candidate is still in the history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Report `SelectionExhausted` and leave the wallpaper alone until the next tick.
    #[default]
    Skip,
    /// Fall back to the least recently shown candidate.
    Repeat,
}

impl std::fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExhaustionPolicy::Skip => write!(f, "skip"),
            ExhaustionPolicy::Repeat => write!(f, "repeat"),
        }
    }
}

/// Number of history entries that are still present in the candidate set.
fn excluded_count(candidates: &[PathBuf], history: &HistoryTracker) -> usize {
    candidates
        .iter()
        .filter(|candidate| history.contains(candidate))
        .count()
}

/// Pick a uniformly random candidate that is not in `history`.
///
/// `candidates` must be deduplicated. Exhaustion is decided before drawing:
/// once the history covers the whole candidate set no draw is attempted.
pub fn select_image<R: Rng + ?Sized>(
    candidates: &[PathBuf],
    history: &HistoryTracker,
    rng: &mut R,
) -> Result<PathBuf, RotationError> {
    if candidates.is_empty() {
        return Err(RotationError::EmptyCandidateSet {
            pattern: String::new(),
        });
    }

    if candidates.len() <= excluded_count(candidates, history) {
        return Err(RotationError::SelectionExhausted {
            candidates: candidates.len(),
        });
    }

    // Rejection sampling, capped so a large history can't keep us spinning.
    let max_draws = candidates.len().saturating_mul(4);
    for _ in 0..max_draws {
        match candidates.choose(rng) {
            Some(pick) if !history.contains(pick) => return Ok(pick.clone()),
            Some(_) => continue,
            None => break,
        }
    }

    let eligible: Vec<&PathBuf> = candidates
        .iter()
        .filter(|candidate| !history.contains(candidate))
        .collect();

    eligible
        .choose(rng)
        .map(|pick| (*pick).clone())
        .ok_or(RotationError::SelectionExhausted {
            candidates: candidates.len(),
        })
}

/// Least recently shown candidate, used when repeats are unavoidable.
pub fn select_repeat(
    candidates: &[PathBuf],
    history: &HistoryTracker,
) -> Result<PathBuf, RotationError> {
    candidates
        .iter()
        .max_by_key(|candidate| {
            history
                .iter()
                .position(|entry| entry == *candidate)
                .unwrap_or(usize::MAX)
        })
        .cloned()
        .ok_or(RotationError::EmptyCandidateSet {
            pattern: String::new(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::path::Path;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn history_of(capacity: usize, names: &[&str]) -> HistoryTracker {
        let mut history = HistoryTracker::new(capacity);
        // names are given most-recent-first
        for name in names.iter().rev() {
            history.record(PathBuf::from(name));
        }
        history
    }

    #[test]
    fn test_never_returns_history_entry() {
        let candidates = paths(&["a.png", "b.png", "c.png", "d.png", "e.png"]);
        let history = history_of(3, &["a.png", "c.png", "e.png"]);

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pick = select_image(&candidates, &history, &mut rng).unwrap();
            assert!(!history.contains(&pick), "seed {} picked {:?}", seed, pick);
        }
    }

    #[test]
    fn test_single_remaining_candidate_is_forced() {
        let candidates = paths(&["a.png", "b.png", "c.png", "d.png"]);
        let history = history_of(3, &["d.png", "b.png", "a.png"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pick = select_image(&candidates, &history, &mut rng).unwrap();
            assert_eq!(pick, PathBuf::from("c.png"));
        }
    }

    #[test]
    fn test_empty_candidate_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = select_image(&[], &HistoryTracker::default(), &mut rng);
        assert!(matches!(result, Err(RotationError::EmptyCandidateSet { .. })));
    }

    #[test]
    fn test_exhausted_when_history_covers_candidates() {
        let candidates = paths(&["a.png", "b.png"]);
        let history = history_of(3, &["b.png", "a.png"]);
        let mut rng = StdRng::seed_from_u64(1);

        let result = select_image(&candidates, &history, &mut rng);
        assert!(matches!(
            result,
            Err(RotationError::SelectionExhausted { candidates: 2 })
        ));
    }

    #[test]
    fn test_stale_history_entries_do_not_exhaust() {
        // History entries for deleted files must not block fresh candidates
        let candidates = paths(&["x.png", "y.png"]);
        let history = history_of(3, &["a.png", "b.png", "c.png"]);
        let mut rng = StdRng::seed_from_u64(3);

        let pick = select_image(&candidates, &history, &mut rng).unwrap();
        assert!(candidates.contains(&pick));
    }

    #[test]
    fn test_not_exhausted_when_set_exceeds_history() {
        let candidates = paths(&["a.png", "b.png", "c.png"]);
        let history = history_of(3, &["b.png", "a.png"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(
                select_image(&candidates, &history, &mut rng).unwrap(),
                PathBuf::from("c.png")
            );
        }
    }

    #[test]
    fn test_selection_is_roughly_uniform() {
        let candidates = paths(&["a.png", "b.png", "c.png", "d.png"]);
        let history = HistoryTracker::new(3);
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<PathBuf, usize> = HashMap::new();

        for _ in 0..4000 {
            let pick = select_image(&candidates, &history, &mut rng).unwrap();
            *counts.entry(pick).or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        for count in counts.values() {
            assert!((800..=1200).contains(count), "skewed count {}", count);
        }
    }

    #[test]
    fn test_select_repeat_picks_least_recent() {
        let candidates = paths(&["a.png", "b.png"]);
        let history = history_of(3, &["b.png", "a.png"]);

        assert_eq!(
            select_repeat(&candidates, &history).unwrap(),
            PathBuf::from("a.png")
        );
    }

    #[test]
    fn test_select_repeat_single_candidate() {
        let candidates = paths(&["only.png"]);
        let history = history_of(3, &["only.png"]);

        assert_eq!(
            select_repeat(&candidates, &history).unwrap(),
            PathBuf::from("only.png")
        );
        assert!(select_repeat(&[], &history).is_err());
        assert!(history.contains(Path::new("only.png")));
    }

    #[test]
    fn test_policy_serde_names() {
        let policy: ExhaustionPolicy = serde_json::from_str("\"repeat\"").unwrap();
        assert_eq!(policy, ExhaustionPolicy::Repeat);
        assert_eq!(ExhaustionPolicy::default().to_string(), "skip");
    }
}
