/// Outcome of one debouncer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceStep {
    /// In cooldown; the threshold was not evaluated this frame.
    Suppressed,
    /// Armed, but the smoothed confidence stayed at or below threshold.
    Idle,
    /// Armed and over threshold. The caller decides (e.g. via the
    /// verifier) whether to accept it with [`Debouncer::confirm`];
    /// an unconfirmed candidate stays armed and consumes no cooldown.
    Candidate,
}

/// Suppresses repeated detections for `max_patience` processed frames
/// after each confirmed one. Starts armed; runs for the life of the
/// stream.
pub struct Debouncer {
    patience: u32,
    max_patience: u32,
}

impl Debouncer {
    pub fn new(max_patience: u32) -> Self {
        Self {
            patience: 0,
            max_patience,
        }
    }

    /// Advance the state machine by one processed frame.
    pub fn step(&mut self, over_threshold: bool) -> DebounceStep {
        if self.patience > 0 {
            self.patience -= 1;
            DebounceStep::Suppressed
        } else if over_threshold {
            DebounceStep::Candidate
        } else {
            DebounceStep::Idle
        }
    }

    /// Accept the current candidate: enter cooldown for `max_patience`
    /// frames.
    pub fn confirm(&mut self) {
        self.patience = self.max_patience;
    }

    pub fn is_armed(&self) -> bool {
        self.patience == 0
    }

    pub fn reset(&mut self) {
        self.patience = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire(d: &mut Debouncer, over: bool) -> bool {
        match d.step(over) {
            DebounceStep::Candidate => {
                d.confirm();
                true
            }
            _ => false,
        }
    }

    #[test]
    fn one_event_per_suppression_window() {
        let mut d = Debouncer::new(20);

        // Frame 0: fires.
        assert!(fire(&mut d, true));
        // Frames 1..=20: suppressed despite high confidence.
        for _ in 1..=20 {
            assert!(!fire(&mut d, true));
        }
        // Frame 21: armed again, fires.
        assert!(fire(&mut d, true));
    }

    #[test]
    fn below_threshold_never_fires() {
        let mut d = Debouncer::new(20);
        for _ in 0..100 {
            assert!(!fire(&mut d, false));
        }
        assert!(d.is_armed());
    }

    #[test]
    fn unconfirmed_candidate_stays_armed() {
        let mut d = Debouncer::new(20);
        // Candidate rejected (verifier said no): no cooldown consumed.
        assert_eq!(d.step(true), DebounceStep::Candidate);
        assert!(d.is_armed());
        // The very next frame can still fire.
        assert!(fire(&mut d, true));
        assert!(!d.is_armed());
    }
}
