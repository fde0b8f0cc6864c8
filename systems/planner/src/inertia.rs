//! Decision inertia that damps oscillation between action kinds.

use std::time::Duration;

use rampart_core::{ActionKind, CandidateAction, InertiaTuning};

/// Remembers the last executed action kind and favours it for a while.
#[derive(Clone, Debug)]
pub struct InertiaTracker {
    tuning: InertiaTuning,
    last: Option<(ActionKind, Duration)>,
}

impl InertiaTracker {
    /// Creates a tracker with no memory.
    #[must_use]
    pub const fn new(tuning: InertiaTuning) -> Self {
        Self { tuning, last: None }
    }

    /// Remembers that an action of `kind` executed at `now`.
    pub fn record(&mut self, kind: ActionKind, now: Duration) {
        self.last = Some((kind, now));
    }

    /// Forgets the favoured kind.
    pub fn clear(&mut self) {
        self.last = None;
    }

    /// Kind currently favoured, if the persistence window is still open at `now`.
    #[must_use]
    pub fn favoured(&self, now: Duration) -> Option<ActionKind> {
        let (kind, at) = self.last?;
        (now.saturating_sub(at) < self.tuning.persistence()).then_some(kind)
    }

    /// Index of the candidate to act on, after inertia.
    ///
    /// Candidates of the favoured kind receive the configured bonus. A
    /// candidate of another kind only wins when its priority exceeds the best
    /// favoured candidate by more than the switch threshold. Ties resolve to
    /// the earliest candidate.
    #[must_use]
    pub fn select(&self, now: Duration, candidates: &[CandidateAction]) -> Option<usize> {
        let favoured = self.favoured(now);

        let best_by = |matching: bool| -> Option<(usize, f32)> {
            candidates
                .iter()
                .enumerate()
                .filter(|(_, candidate)| (Some(candidate.kind()) == favoured) == matching)
                .fold(None, |best: Option<(usize, f32)>, (index, candidate)| match best {
                    Some((_, priority)) if priority >= candidate.priority => best,
                    _ => Some((index, candidate.priority)),
                })
        };

        match (best_by(true), best_by(false)) {
            (Some((matching, priority)), Some((other, rival))) => {
                let held = priority + self.tuning.bonus;
                if rival > held + self.tuning.switch_threshold {
                    Some(other)
                } else {
                    Some(matching)
                }
            }
            (Some((matching, _)), None) => Some(matching),
            (None, Some((other, _))) => Some(other),
            (None, None) => None,
        }
    }
}
