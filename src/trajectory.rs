use std::collections::VecDeque;

use nalgebra as na;

/// One ball observation: image-space center plus frame/time bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    pub pos: na::Point2<f32>,
    pub frame: u64,
    pub timestamp: f32,
}

/// Sliding window of ball positions, oldest evicted first. Features are
/// computed on demand from the current contents, never cached.
///
/// Vertical axis grows downward (image coordinates), so a negative
/// `height_trend` means the ball is rising.
#[derive(Debug, Clone)]
pub struct BallTrajectory {
    samples: VecDeque<TrajectorySample>,
    capacity: usize,
}

/// ~2 seconds at 30 fps.
pub const DEFAULT_WINDOW: usize = 60;

const SPEED_PAIRS: usize = 5;
const DIRECTION_SPAN: usize = 6;
const TREND_WINDOW: usize = 6;

impl Default for BallTrajectory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WINDOW)
    }
}

impl BallTrajectory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends the current frame's ball center, evicting the oldest sample
    /// once the window is full.
    pub fn push(&mut self, cx: f32, cy: f32, frame: u64, timestamp: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }

        self.samples.push_back(TrajectorySample {
            pos: na::Point2::new(cx, cy),
            frame,
            timestamp,
        });
    }

    /// Mean frame-to-frame displacement in px over the last up to
    /// `SPEED_PAIRS` consecutive sample pairs.
    pub fn speed(&self) -> f32 {
        let n = self.samples.len();
        if n < 2 {
            return 0.;
        }

        let first = n.saturating_sub(SPEED_PAIRS + 1);
        let mut sum = 0.;
        let mut count = 0;

        for i in first..n - 1 {
            sum += na::distance(&self.samples[i].pos, &self.samples[i + 1].pos);
            count += 1;
        }

        sum / count as f32
    }

    /// Unit vector from the sample `DIRECTION_SPAN` positions back (or the
    /// oldest available) to the latest sample. Zero vector below 2 samples.
    pub fn direction(&self) -> na::Vector2<f32> {
        let n = self.samples.len();
        if n < 2 {
            return na::Vector2::zeros();
        }

        let from = self.samples[n.saturating_sub(DIRECTION_SPAN)].pos;
        let to = self.samples[n - 1].pos;
        let delta = to - from;

        delta / (delta.norm() + 1e-6)
    }

    /// Mean of frame-to-frame vertical deltas over the last up to
    /// `TREND_WINDOW` samples. Negative = rising, positive = falling.
    pub fn height_trend(&self) -> f32 {
        let n = self.samples.len();
        if n < 3 {
            return 0.;
        }

        let first = n.saturating_sub(TREND_WINDOW);
        let mut sum = 0.;
        let mut count = 0;

        for i in first..n - 1 {
            sum += self.samples[i + 1].pos.y - self.samples[i].pos.y;
            count += 1;
        }

        sum / count as f32
    }

    #[inline]
    pub fn last_position(&self) -> Option<na::Point2<f32>> {
        self.samples.back().map(|s| s.pos)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TrajectorySample> {
        self.samples.iter()
    }
}
