//! Scope trace buffers.
//!
//! `ScopeHistory` holds a fixed number of parallel traces (one per probed
//! node or component), each a 500-slot array of (min, max) pairs covering the
//! current scope window. The simulation worker is the only writer; display
//! threads read concurrently without locking. Slot payloads are `AtomicU64`
//! f64 bit patterns and the slot count is published with a release store, so
//! a reader that observes slot `i` as valid is guaranteed to see its fully
//! written contents.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use gv_core::numeric::Real;

/// Slots per trace window.
pub const SCOPE_SLOTS: usize = 500;

/// What happens when the window fills up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    /// Start a fresh window at the current simulation time and keep going.
    Continuous,
    /// Freeze the completed window and stop recording.
    OneShot,
}

/// One (min, max) cell of a trace.
///
/// The two halves are independent atomics; within the in-progress slot a
/// reader may pair a min and max from different samples, which is fine for a
/// display. A torn f64 is impossible.
#[derive(Debug)]
pub struct TraceSlot {
    min: AtomicU64,
    max: AtomicU64,
}

impl TraceSlot {
    fn new() -> Self {
        Self {
            min: AtomicU64::new(f64::NAN.to_bits()),
            max: AtomicU64::new(f64::NAN.to_bits()),
        }
    }

    fn set(&self, min: Real, max: Real) {
        self.min.store(min.to_bits(), Ordering::Relaxed);
        self.max.store(max.to_bits(), Ordering::Relaxed);
    }

    fn widen(&self, value: Real) {
        let min = f64::from_bits(self.min.load(Ordering::Relaxed));
        let max = f64::from_bits(self.max.load(Ordering::Relaxed));
        if value < min {
            self.min.store(value.to_bits(), Ordering::Relaxed);
        }
        if value > max {
            self.max.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// Read the pair. NaN/NaN marks a slot the clock stepped over.
    pub fn read(&self) -> (Real, Real) {
        (
            f64::from_bits(self.min.load(Ordering::Relaxed)),
            f64::from_bits(self.max.load(Ordering::Relaxed)),
        )
    }
}

struct Trace {
    slots: Vec<TraceSlot>,
}

impl Trace {
    fn new() -> Self {
        Self {
            slots: (0..SCOPE_SLOTS).map(|_| TraceSlot::new()).collect(),
        }
    }
}

/// Parallel min/max trace windows with a single writer and lock-free readers.
pub struct ScopeHistory {
    traces: Vec<Trace>,
    /// Valid slot count, shared by all traces. Release on store, acquire on
    /// load: the fence that makes whole slots visible.
    len: AtomicUsize,
    window_start_bits: AtomicU64,
    span_bits: AtomicU64,
    one_shot: AtomicBool,
    stopped: AtomicBool,
    /// Trigger level on trace 0, f64 bits; NaN means no trigger.
    trigger_bits: AtomicU64,
    armed: AtomicBool,
    /// Last trace-0 sample seen while armed, for edge detection.
    prev_bits: AtomicU64,
}

impl ScopeHistory {
    /// `traces` probed signals, all sharing one time window of `span_s`.
    pub fn new(traces: usize, span_s: Real, mode: ScopeMode) -> Self {
        assert!(span_s > 0.0, "scope span must be positive");
        Self {
            traces: (0..traces).map(|_| Trace::new()).collect(),
            len: AtomicUsize::new(0),
            window_start_bits: AtomicU64::new(0f64.to_bits()),
            span_bits: AtomicU64::new(span_s.to_bits()),
            one_shot: AtomicBool::new(mode == ScopeMode::OneShot),
            stopped: AtomicBool::new(false),
            trigger_bits: AtomicU64::new(f64::NAN.to_bits()),
            armed: AtomicBool::new(false),
            prev_bits: AtomicU64::new(f64::NAN.to_bits()),
        }
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    pub fn span_s(&self) -> Real {
        f64::from_bits(self.span_bits.load(Ordering::Relaxed))
    }

    pub fn window_start_s(&self) -> Real {
        f64::from_bits(self.window_start_bits.load(Ordering::Relaxed))
    }

    pub fn mode(&self) -> ScopeMode {
        if self.one_shot.load(Ordering::Relaxed) {
            ScopeMode::OneShot
        } else {
            ScopeMode::Continuous
        }
    }

    /// Trigger level on trace 0, if one is set.
    pub fn trigger(&self) -> Option<Real> {
        let level = f64::from_bits(self.trigger_bits.load(Ordering::Relaxed));
        if level.is_nan() {
            None
        } else {
            Some(level)
        }
    }

    /// Arm (or clear) a rising-edge trigger on trace 0: recording holds off
    /// until that trace crosses `level` from below. Writer only.
    pub fn set_trigger(&self, level: Option<Real>) {
        let bits = level.unwrap_or(f64::NAN).to_bits();
        self.trigger_bits.store(bits, Ordering::Relaxed);
        self.armed.store(level.is_some(), Ordering::Relaxed);
        self.prev_bits.store(f64::NAN.to_bits(), Ordering::Relaxed);
    }

    /// True once a one-shot window has filled and recording has frozen.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Published slot count of the current window.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Restart recording at `t_s` with a new span and mode. Writer only.
    pub fn reset(&self, t_s: Real, span_s: Real, mode: ScopeMode) {
        assert!(span_s > 0.0, "scope span must be positive");
        self.span_bits.store(span_s.to_bits(), Ordering::Relaxed);
        self.window_start_bits.store(t_s.to_bits(), Ordering::Relaxed);
        self.one_shot
            .store(mode == ScopeMode::OneShot, Ordering::Relaxed);
        self.stopped.store(false, Ordering::Relaxed);
        self.armed.store(self.trigger().is_some(), Ordering::Relaxed);
        self.prev_bits.store(f64::NAN.to_bits(), Ordering::Relaxed);
        self.len.store(0, Ordering::Release);
    }

    /// Record one sample per trace at simulation time `t_s`. Writer only;
    /// `samples.len()` must equal the trace count.
    pub fn record(&self, t_s: Real, samples: &[Real]) {
        assert_eq!(samples.len(), self.traces.len());
        if self.stopped.load(Ordering::Relaxed) {
            return;
        }

        if self.armed.load(Ordering::Relaxed) {
            let level = f64::from_bits(self.trigger_bits.load(Ordering::Relaxed));
            let prev = f64::from_bits(self.prev_bits.load(Ordering::Relaxed));
            let v = samples[0];
            // NaN prev (first sample while armed) never fires.
            if prev < level && v >= level {
                self.armed.store(false, Ordering::Relaxed);
                self.window_start_bits.store(t_s.to_bits(), Ordering::Relaxed);
                self.len.store(0, Ordering::Release);
            } else {
                self.prev_bits.store(v.to_bits(), Ordering::Relaxed);
                return;
            }
        }

        let span = self.span_s();
        let mut start = self.window_start_s();
        let mut idx =
            (((t_s - start) / span) * SCOPE_SLOTS as Real).floor() as i64;

        if idx >= SCOPE_SLOTS as i64 {
            if self.one_shot.load(Ordering::Relaxed) {
                self.stopped.store(true, Ordering::Relaxed);
                return;
            }
            // Continuous: the window restarts where the sample landed.
            start = t_s;
            self.window_start_bits.store(start.to_bits(), Ordering::Relaxed);
            self.len.store(0, Ordering::Release);
            idx = 0;
        }
        let idx = idx.max(0) as usize;

        // Writer owns len; relaxed read of our own previous store is exact.
        let len = self.len.load(Ordering::Relaxed);
        if idx < len {
            // Another sample for the in-progress slot: widen min/max.
            debug_assert_eq!(idx, len - 1, "scope time went backwards");
            for (trace, &v) in self.traces.iter().zip(samples) {
                trace.slots[idx].widen(v);
            }
            return;
        }

        for (trace, &v) in self.traces.iter().zip(samples) {
            // Slots skipped since the last sample stay NaN for the display.
            for slot in &trace.slots[len..idx] {
                slot.set(f64::NAN, f64::NAN);
            }
            trace.slots[idx].set(v, v);
        }
        self.len.store(idx + 1, Ordering::Release);
    }

    /// Copy out one trace's published slots.
    pub fn snapshot(&self, trace: usize) -> Vec<(Real, Real)> {
        let len = self.len.load(Ordering::Acquire);
        self.traces[trace].slots[..len]
            .iter()
            .map(TraceSlot::read)
            .collect()
    }
}

impl std::fmt::Debug for ScopeHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeHistory")
            .field("traces", &self.traces.len())
            .field("len", &self.len())
            .field("span_s", &self.span_s())
            .field("mode", &self.mode())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn samples_in_one_slot_widen_min_max() {
        let h = ScopeHistory::new(1, 1.0, ScopeMode::Continuous);
        // One slot spans 2ms; these three land together.
        h.record(0.0000, &[5.0]);
        h.record(0.0005, &[2.0]);
        h.record(0.0010, &[8.0]);
        assert_eq!(h.len(), 1);
        assert_eq!(h.snapshot(0), vec![(2.0, 8.0)]);
    }

    #[test]
    fn skipped_slots_are_nan() {
        let h = ScopeHistory::new(1, 1.0, ScopeMode::Continuous);
        h.record(0.000, &[1.0]);
        h.record(0.006, &[2.0]); // slot 3; slots 1 and 2 never sampled
        let snap = h.snapshot(0);
        assert_eq!(snap.len(), 4);
        assert_eq!(snap[0], (1.0, 1.0));
        assert!(snap[1].0.is_nan() && snap[1].1.is_nan());
        assert!(snap[2].0.is_nan() && snap[2].1.is_nan());
        assert_eq!(snap[3], (2.0, 2.0));
    }

    #[test]
    fn continuous_mode_restarts_the_window() {
        let h = ScopeHistory::new(1, 1.0, ScopeMode::Continuous);
        h.record(0.0, &[1.0]);
        h.record(1.5, &[9.0]); // past the window end
        assert_eq!(h.window_start_s(), 1.5);
        assert_eq!(h.snapshot(0), vec![(9.0, 9.0)]);
        assert!(!h.is_stopped());
    }

    #[test]
    fn one_shot_mode_freezes_at_the_window_end() {
        let h = ScopeHistory::new(1, 1.0, ScopeMode::OneShot);
        h.record(0.0, &[1.0]);
        h.record(0.999, &[2.0]);
        let before = h.len();
        h.record(1.5, &[9.0]);
        assert!(h.is_stopped());
        assert_eq!(h.len(), before);
        // Further samples are ignored until reset
        h.record(2.0, &[9.0]);
        assert_eq!(h.len(), before);
        h.reset(2.0, 1.0, ScopeMode::OneShot);
        assert!(!h.is_stopped());
        assert_eq!(h.len(), 0);
    }

    #[test]
    fn trigger_holds_recording_until_a_rising_crossing() {
        let h = ScopeHistory::new(1, 1.0, ScopeMode::OneShot);
        h.set_trigger(Some(2.5));
        h.reset(0.0, 1.0, ScopeMode::OneShot);
        h.record(0.000, &[5.0]); // first armed sample, no edge yet
        h.record(0.002, &[1.0]);
        h.record(0.004, &[2.0]);
        assert_eq!(h.len(), 0);
        // Rising crossing of 2.5: the window starts here
        h.record(0.006, &[3.0]);
        assert_eq!(h.window_start_s(), 0.006);
        assert_eq!(h.snapshot(0), vec![(3.0, 3.0)]);
        // Disarmed now; later samples record normally
        h.record(0.009, &[1.0]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn reader_never_sees_an_unwritten_published_slot() {
        let h = Arc::new(ScopeHistory::new(2, 1.0, ScopeMode::Continuous));
        let reader = {
            let h = Arc::clone(&h);
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    let len = h.len();
                    for trace in 0..2 {
                        for (min, max) in h.snapshot(trace) {
                            let nan_fill = min.is_nan() && max.is_nan();
                            assert!(nan_fill || min <= max);
                        }
                    }
                    let _ = len;
                }
            })
        };
        let mut t = 0.0;
        for i in 0..5_000 {
            let v = (i % 100) as f64;
            h.record(t, &[v, -v]);
            t += 0.0004;
        }
        reader.join().unwrap();
    }
}
