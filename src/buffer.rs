//! Fixed-capacity sliding buffers for the streaming pipeline.
//!
//! Both buffers are allocated once at stream start and mutated in place
//! every frame; they never reallocate.

/// Circular buffer over the most recent raw audio samples. Each update
/// discards the oldest `frame.len()` samples and appends the gain-scaled
/// frame, keeping `capacity - frame.len()` samples of overlap.
pub struct RawWindow {
    samples: Vec<f32>,
}

impl RawWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
        }
    }

    /// Shift out the oldest `frame.len()` samples and write the scaled
    /// frame into the freed tail. Gain is applied multiplicatively with
    /// no clamping.
    ///
    /// Panics if `frame.len() > capacity`; a partial frame is a contract
    /// violation, not a truncation case.
    pub fn update(&mut self, frame: &[f32], gain: f32) {
        let f = frame.len();
        let r = self.samples.len();
        assert!(f <= r, "frame of {} samples exceeds window capacity {}", f, r);

        self.samples.copy_within(f.., 0);
        for (dst, &src) in self.samples[r - f..].iter_mut().zip(frame) {
            *dst = gain * src;
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }
}

/// Ordered fixed-capacity window of feature vectors (oldest first) that
/// advances by shift-and-append of a batch. One implementation serves both
/// the mel window (batch of 8 per frame) and the embedding window (batch
/// of 1); they differ only in element type and batch size.
pub struct SlidingWindow<T> {
    elements: Vec<T>,
}

impl<T: Clone> SlidingWindow<T> {
    pub fn new(capacity: usize, fill: T) -> Self {
        Self {
            elements: vec![fill; capacity],
        }
    }

    /// Drop the oldest `batch.len()` elements, shift the rest toward the
    /// front preserving order, and append `batch` at the tail. An empty
    /// batch is a no-op. Panics if the batch exceeds the capacity.
    pub fn advance(&mut self, batch: &[T]) {
        let k = batch.len();
        let cap = self.elements.len();
        assert!(k <= cap, "batch of {} exceeds window capacity {}", k, cap);
        if k == 0 {
            return;
        }

        self.elements.rotate_left(k);
        self.elements[cap - k..].clone_from_slice(batch);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_window_keeps_overlap_and_scales_frame() {
        let mut window = RawWindow::new(8);
        window.update(&[1.0, 2.0, 3.0, 4.0, 5.0], 1.0);
        let before: Vec<f32> = window.as_slice().to_vec();

        window.update(&[6.0, 7.0, 8.0, 9.0, 10.0], 2.0);
        let after = window.as_slice();

        // First R-F samples equal the previous buffer from index F on.
        assert_eq!(&after[..3], &before[5..]);
        // Last F samples are the gain-scaled new frame.
        assert_eq!(&after[3..], &[12.0, 14.0, 16.0, 18.0, 20.0]);
    }

    #[test]
    fn raw_window_full_replacement() {
        let mut window = RawWindow::new(4);
        window.update(&[1.0, 2.0, 3.0, 4.0], 3.0);
        assert_eq!(window.as_slice(), &[3.0, 6.0, 9.0, 12.0]);
    }

    #[test]
    #[should_panic]
    fn raw_window_rejects_oversized_frame() {
        let mut window = RawWindow::new(4);
        window.update(&[0.0; 5], 1.0);
    }

    #[test]
    fn sliding_window_advance_preserves_order() {
        let mut window = SlidingWindow::new(5, 0u32);
        window.advance(&[1, 2, 3, 4, 5]);
        window.advance(&[6, 7]);
        assert_eq!(window.as_slice(), &[3, 4, 5, 6, 7]);
    }

    #[test]
    fn sliding_window_empty_batch_is_noop() {
        let mut window = SlidingWindow::new(3, 0u32);
        window.advance(&[1, 2, 3]);
        window.advance(&[]);
        assert_eq!(window.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn sliding_window_full_batch_replaces_contents() {
        let mut window = SlidingWindow::new(3, 0u32);
        window.advance(&[1, 2, 3]);
        window.advance(&[4, 5, 6]);
        assert_eq!(window.as_slice(), &[4, 5, 6]);
    }

    #[test]
    #[should_panic]
    fn sliding_window_rejects_oversized_batch() {
        let mut window = SlidingWindow::new(3, 0u32);
        window.advance(&[1, 2, 3, 4]);
    }
}
