//! The merged set of re-render breakpoints.
//!
//! Slide bounds, shape enter/leave times, and viewport-change timestamps all
//! feed one accumulator; finalization yields the sorted, deduplicated
//! timeline that drives whiteboard frame emission.

/// Accumulator for frame breakpoints.
#[derive(Debug, Default, Clone)]
pub struct Breakpoints {
    times: Vec<f64>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one breakpoint candidate.
    pub fn push(&mut self, t: f64) {
        self.times.push(t);
    }

    /// Record several breakpoint candidates.
    pub fn extend(&mut self, times: impl IntoIterator<Item = f64>) {
        self.times.extend(times);
    }

    /// Number of raw candidates recorded so far.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Produce the final breakpoint timeline: candidates outside
    /// `[0, duration]` dropped, `duration` appended, sorted, adjacent
    /// equals collapsed. The result is strictly increasing and every value
    /// is `<= duration`.
    pub fn finalize(mut self, duration: f64) -> Vec<f64> {
        self.times.retain(|&t| (0.0..=duration).contains(&t));
        self.times.push(duration);
        self.times.sort_by(f64::total_cmp);
        self.times.dedup();
        self.times
    }
}

/// Adjacent breakpoint pairs, each one whiteboard frame's lifetime.
pub fn frame_intervals(times: &[f64]) -> impl Iterator<Item = (f64, f64)> + '_ {
    times.windows(2).map(|pair| (pair[0], pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_sorts_dedups_and_caps_at_duration() {
        let mut bp = Breakpoints::new();
        bp.extend([0.0, 10.0, 1.0, 3.0, 5.0, 8.0, 3.0, 12.5]);
        let times = bp.finalize(10.0);
        assert_eq!(times, vec![0.0, 1.0, 3.0, 5.0, 8.0, 10.0]);
        assert!(times.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn duration_is_always_terminal() {
        let mut bp = Breakpoints::new();
        bp.extend([0.0, 10.0]);
        assert_eq!(bp.finalize(10.0), vec![0.0, 10.0]);

        let mut bp = Breakpoints::new();
        bp.push(0.0);
        assert_eq!(bp.finalize(7.5), vec![0.0, 7.5]);
    }

    #[test]
    fn negative_candidates_are_dropped() {
        let mut bp = Breakpoints::new();
        bp.extend([-1.0, 0.0, 2.0]);
        assert_eq!(bp.finalize(4.0), vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn frame_intervals_walks_adjacent_pairs() {
        let times = vec![0.0, 1.0, 3.0, 5.0, 8.0, 10.0];
        let pairs: Vec<_> = frame_intervals(&times).collect();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[0], (0.0, 1.0));
        assert_eq!(pairs[4], (8.0, 10.0));
    }
}
