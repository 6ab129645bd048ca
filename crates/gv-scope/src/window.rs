//! Moving averages over simulation time.
//!
//! `WindowedAverage` is a fixed ring of per-bin means with a running sum, so
//! the average over the whole window is O(1) to read. `TimedAverage` sits in
//! front of it and converts a continuous time axis into discrete bins: samples
//! landing in the same bin accumulate, and crossing into a new bin flushes
//! the finished bin's mean into the ring.

use gv_core::numeric::Real;

/// Fixed-capacity ring of bin means with an O(1) running-sum average.
#[derive(Debug, Clone)]
pub struct WindowedAverage {
    bins: Vec<Real>,
    next: usize,
    filled: usize,
    sum: Real,
}

impl WindowedAverage {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window needs at least one bin");
        Self {
            bins: vec![0.0; capacity],
            next: 0,
            filled: 0,
            sum: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bins.len()
    }

    /// Number of bins pushed so far, saturating at capacity.
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.bins.len()
    }

    /// Push one bin mean, evicting the oldest once the ring is full.
    pub fn push(&mut self, value: Real) {
        self.sum += value - self.bins[self.next];
        self.bins[self.next] = value;
        self.next = (self.next + 1) % self.bins.len();
        if self.filled < self.bins.len() {
            self.filled += 1;
        }
    }

    /// Average over the bins pushed so far; `None` before the first push.
    pub fn average(&self) -> Option<Real> {
        if self.filled == 0 {
            None
        } else {
            Some(self.sum / self.filled as Real)
        }
    }

    pub fn clear(&mut self) {
        self.bins.fill(0.0);
        self.next = 0;
        self.filled = 0;
        self.sum = 0.0;
    }
}

/// Time-bucketed aggregator feeding a [`WindowedAverage`].
///
/// Maps simulation time onto bin indices (`t * bins / span`). Successive
/// updates inside one bin accumulate a running sum/count; the first update
/// past the bin boundary flushes the finished bin's mean, zero-filling any
/// bins that were skipped entirely.
#[derive(Debug, Clone)]
pub struct TimedAverage {
    window: WindowedAverage,
    span_s: Real,
    bin: Option<u64>,
    acc_sum: Real,
    acc_count: u32,
}

impl TimedAverage {
    /// `span_s` is the time covered by the whole window; `bins` its resolution.
    pub fn new(span_s: Real, bins: usize) -> Self {
        assert!(span_s > 0.0, "window span must be positive");
        Self {
            window: WindowedAverage::new(bins),
            span_s,
            bin: None,
            acc_sum: 0.0,
            acc_count: 0,
        }
    }

    pub fn span_s(&self) -> Real {
        self.span_s
    }

    /// Span of a single bin in seconds.
    pub fn bin_span_s(&self) -> Real {
        self.span_s / self.window.capacity() as Real
    }

    fn bin_index(&self, t_s: Real) -> u64 {
        (t_s * self.window.capacity() as Real / self.span_s) as u64
    }

    /// Record one sample at simulation time `t_s`.
    ///
    /// Time must be monotonically non-decreasing across calls; a regression
    /// is a caller bug and panics.
    pub fn record(&mut self, t_s: Real, value: Real) {
        let bin = self.bin_index(t_s);
        match self.bin {
            None => {
                self.bin = Some(bin);
                self.acc_sum = value;
                self.acc_count = 1;
            }
            Some(current) if bin == current => {
                self.acc_sum += value;
                self.acc_count += 1;
            }
            Some(current) => {
                assert!(bin > current, "time went backwards in TimedAverage");
                self.flush_current();
                // Bins the clock stepped over entirely carry no samples.
                for _ in current + 1..bin {
                    self.window.push(0.0);
                }
                self.bin = Some(bin);
                self.acc_sum = value;
                self.acc_count = 1;
            }
        }
    }

    fn flush_current(&mut self) {
        if self.acc_count > 0 {
            self.window.push(self.acc_sum / self.acc_count as Real);
        }
    }

    /// Current estimate: the window average once bins have flushed, falling
    /// back to the in-progress bin mean before any bin has completed.
    pub fn query(&self) -> Real {
        if let Some(avg) = self.window.average() {
            return avg;
        }
        if self.acc_count > 0 {
            self.acc_sum / self.acc_count as Real
        } else {
            0.0
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.bin = None;
        self.acc_sum = 0.0;
        self.acc_count = 0;
    }
}
