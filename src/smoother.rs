use std::collections::VecDeque;

/// Moving average over the most recent raw confidence scores. With a
/// window length of 1 this is a pass-through.
pub struct ScoreSmoother {
    scores: VecDeque<f32>,
    max_scores: usize,
}

impl ScoreSmoother {
    pub fn new(max_scores: usize) -> Self {
        assert!(max_scores > 0, "smoothing window must hold at least one score");
        Self {
            scores: VecDeque::with_capacity(max_scores),
            max_scores,
        }
    }

    /// Push a raw score, evicting the oldest on overflow, and return the
    /// mean of the current contents.
    pub fn push(&mut self, score: f32) -> f32 {
        if self.scores.len() >= self.max_scores {
            self.scores.pop_front();
        }
        self.scores.push_back(score);
        self.scores.iter().sum::<f32>() / self.scores.len() as f32
    }

    /// The mean [`push`](Self::push) would return for `score`, without
    /// committing it.
    pub fn preview(&self, score: f32) -> f32 {
        let evicted = if self.scores.len() >= self.max_scores {
            self.scores.len() + 1 - self.max_scores
        } else {
            0
        };
        let sum: f32 = self.scores.iter().skip(evicted).sum::<f32>() + score;
        sum / (self.scores.len() - evicted + 1) as f32
    }

    pub fn reset(&mut self) {
        self.scores.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_one_is_pass_through() {
        let mut smoother = ScoreSmoother::new(1);
        assert_eq!(smoother.push(0.3), 0.3);
        assert_eq!(smoother.push(0.9), 0.9);
    }

    #[test]
    fn mean_of_seven() {
        let mut smoother = ScoreSmoother::new(7);
        let mut last = 0.0;
        for i in 1..=7 {
            last = smoother.push(i as f32 / 10.0);
        }
        assert!((last - 0.4).abs() < 1e-6);
    }

    #[test]
    fn preview_matches_push() {
        let mut smoother = ScoreSmoother::new(3);
        for &s in &[0.1, 0.5, 0.9, 0.2] {
            let previewed = smoother.preview(s);
            assert_eq!(previewed, smoother.push(s));
        }
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut smoother = ScoreSmoother::new(2);
        smoother.push(1.0);
        smoother.push(0.0);
        // 1.0 evicted; mean of [0.0, 0.5]
        assert!((smoother.push(0.5) - 0.25).abs() < 1e-6);
    }
}
