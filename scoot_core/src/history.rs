//! Fixed-capacity window of timestamped values.

use std::collections::VecDeque;

/// Ring of `(timestamp_s, value)` points; once full, the oldest point is overwritten.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    points: VecDeque<(f64, f64)>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, timestamp_s: f64, value: f64) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back((timestamp_s, value));
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        self.points.back().copied()
    }

    /// All points, oldest first.
    pub fn values(&self) -> Vec<(f64, f64)> {
        self.points.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_points_in_order() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(i as f64, (i * 10) as f64);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.values(), vec![(2.0, 20.0), (3.0, 30.0), (4.0, 40.0)]);
        assert_eq!(h.last(), Some((4.0, 40.0)));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut h = History::new(0);
        assert_eq!(h.capacity(), 1);
        h.push(1.0, 1.0);
        h.push(2.0, 2.0);
        assert_eq!(h.values(), vec![(2.0, 2.0)]);
    }
}
