//! Diode dynamic-resistance law.
//!
//! The diode is modeled as a voltage-dependent resistance
//! `R = clamp(exp(50 * (0.7 - dV)), R_MIN, R_MAX)` where `dV` is the forward
//! voltage across it. The raw law reacts violently near the knee, so the
//! solver applies exponential smoothing to the resistance between iterations
//! to damp oscillation.

use gv_core::Real;

/// Parameters of the diode resistance law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeLaw {
    /// Knee voltage (volts).
    pub knee_v: Real,
    /// Exponential steepness.
    pub steepness: Real,
    /// Lower resistance clamp (ohms).
    pub r_min: Real,
    /// Upper resistance clamp (ohms).
    pub r_max: Real,
    /// Exponential smoothing factor applied per solver iteration.
    pub smoothing: Real,
}

impl Default for DiodeLaw {
    fn default() -> Self {
        Self {
            knee_v: 0.7,
            steepness: 50.0,
            r_min: 0.1,
            r_max: 1e6,
            smoothing: 0.01,
        }
    }
}

impl DiodeLaw {
    /// Target (unsmoothed) resistance for a forward voltage `dv`.
    pub fn target_resistance(&self, dv: Real) -> Real {
        let exponent = self.steepness * (self.knee_v - dv);
        // exp() overflows f64 around 709; the clamp bound is hit long before
        // that, so cap the exponent instead of evaluating it.
        if exponent > 700.0 {
            return self.r_max;
        }
        exponent.exp().clamp(self.r_min, self.r_max)
    }

    /// One smoothing step from the previous resistance toward the target.
    pub fn smooth(&self, previous: Real, dv: Real) -> Real {
        previous + self.smoothing * (self.target_resistance(dv) - previous)
    }

    /// Resistance to assume before the first solve (zero bias).
    pub fn initial_resistance(&self) -> Real {
        self.target_resistance(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistance_is_monotone_decreasing_in_forward_voltage() {
        let law = DiodeLaw::default();
        let mut prev = law.target_resistance(-1.0);
        for i in 0..200 {
            let dv = -1.0 + i as f64 * 0.02;
            let r = law.target_resistance(dv);
            assert!(r <= prev, "dv={dv}: {r} > {prev}");
            prev = r;
        }
    }

    #[test]
    fn resistance_stays_clamped() {
        let law = DiodeLaw::default();
        assert_eq!(law.target_resistance(-100.0), law.r_max);
        assert_eq!(law.target_resistance(100.0), law.r_min);
        assert_eq!(law.initial_resistance(), law.r_max);
    }

    #[test]
    fn knee_is_near_unity_resistance() {
        let law = DiodeLaw::default();
        let r = law.target_resistance(law.knee_v);
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn smoothing_bounds_per_step_change() {
        let law = DiodeLaw::default();
        // From fully off, one step toward fully on moves at most 1% of the gap
        let r0 = law.r_max;
        let r1 = law.smooth(r0, 2.0);
        let max_move = law.smoothing * (law.r_max - law.r_min);
        assert!(r0 - r1 <= max_move + 1e-9);
        assert!(r1 < r0);
        // Never jumps straight to the clamp extreme
        assert!(r1 > law.r_min);
    }
}
