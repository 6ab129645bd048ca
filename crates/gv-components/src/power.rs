//! Power source waveforms.
//!
//! Terminal 0 of a power source is the driven side; terminal 1 must bind to
//! the ground node. The square wave is not an ideal step: it rises and falls
//! over a small fixed fraction of the period, which keeps the fixed-point
//! solver from chasing a discontinuity.

use crate::error::{ComponentError, ComponentResult};
use gv_core::units::{Frequency, Voltage};
use gv_core::Real;

/// Ramp-up time for DC sources when the DC ramp is enabled (seconds).
pub const DC_RAMP_TIME_S: Real = 0.1;

/// Fraction of the period spent on each square-wave edge.
const SQUARE_EDGE_FRACTION: Real = 1.0 / 50.0;

/// Waveform shape of a power source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// Constant voltage, optionally ramped in linearly over [`DC_RAMP_TIME_S`].
    Dc,
    /// `V * sin(2*pi*f*t)`.
    Sine { freq: Frequency },
    /// Symmetric square wave between +V and -V with trapezoidal edges.
    Square { freq: Frequency },
}

/// A two-terminal power source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSource {
    pub amplitude: Voltage,
    pub waveform: Waveform,
}

impl PowerSource {
    pub fn dc(amplitude: Voltage) -> Self {
        Self {
            amplitude,
            waveform: Waveform::Dc,
        }
    }

    pub fn sine(amplitude: Voltage, freq: Frequency) -> ComponentResult<Self> {
        if freq.value <= 0.0 {
            return Err(ComponentError::NonPhysical {
                what: "sine frequency must be positive",
            });
        }
        Ok(Self {
            amplitude,
            waveform: Waveform::Sine { freq },
        })
    }

    pub fn square(amplitude: Voltage, freq: Frequency) -> ComponentResult<Self> {
        if freq.value <= 0.0 {
            return Err(ComponentError::NonPhysical {
                what: "square frequency must be positive",
            });
        }
        Ok(Self {
            amplitude,
            waveform: Waveform::Square { freq },
        })
    }

    /// Frequency of the source, if it is an AC waveform.
    pub fn frequency(&self) -> Option<Frequency> {
        match self.waveform {
            Waveform::Dc => None,
            Waveform::Sine { freq } | Waveform::Square { freq } => Some(freq),
        }
    }

    /// Instantaneous terminal-0 voltage at simulation time `t` (seconds).
    ///
    /// `dc_ramp` only affects DC sources.
    pub fn value_at(&self, t: Real, dc_ramp: bool) -> Real {
        let v = self.amplitude.value;
        match self.waveform {
            Waveform::Dc => {
                if dc_ramp && t < DC_RAMP_TIME_S {
                    v * (t / DC_RAMP_TIME_S)
                } else {
                    v
                }
            }
            Waveform::Sine { freq } => v * (2.0 * std::f64::consts::PI * freq.value * t).sin(),
            Waveform::Square { freq } => square_value(v, freq.value, t),
        }
    }
}

/// Trapezoidal square wave: +v for the first half period, -v for the second,
/// with linear edges of width `SQUARE_EDGE_FRACTION * period` centered on
/// each transition point.
fn square_value(v: Real, freq: Real, t: Real) -> Real {
    let period = 1.0 / freq;
    let edge = SQUARE_EDGE_FRACTION * period;
    let phase = t.rem_euclid(period);
    let half = period / 2.0;

    if phase < edge {
        // Rising edge at the period boundary
        -v + 2.0 * v * (phase / edge)
    } else if phase < half {
        v
    } else if phase < half + edge {
        // Falling edge
        v - 2.0 * v * ((phase - half) / edge)
    } else {
        -v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_core::units::{hz, volt};

    #[test]
    fn dc_ramp_is_linear_then_flat() {
        let src = PowerSource::dc(volt(10.0));
        assert_eq!(src.value_at(0.0, true), 0.0);
        let mid = src.value_at(DC_RAMP_TIME_S / 2.0, true);
        assert!((mid - 5.0).abs() < 1e-12);
        assert_eq!(src.value_at(DC_RAMP_TIME_S, true), 10.0);
        assert_eq!(src.value_at(1.0, true), 10.0);
        // Ramp disabled: full value immediately
        assert_eq!(src.value_at(0.0, false), 10.0);
    }

    #[test]
    fn sine_hits_quarter_points() {
        let src = PowerSource::sine(volt(2.0), hz(50.0)).unwrap();
        let quarter = 1.0 / 50.0 / 4.0;
        assert!((src.value_at(quarter, false) - 2.0).abs() < 1e-9);
        assert!(src.value_at(0.0, false).abs() < 1e-12);
    }

    #[test]
    fn square_plateaus_and_edges() {
        let src = PowerSource::square(volt(5.0), hz(100.0)).unwrap();
        let period = 1.0 / 100.0;
        // Middle of the high plateau
        assert_eq!(src.value_at(period * 0.25, false), 5.0);
        // Middle of the low plateau
        assert_eq!(src.value_at(period * 0.75, false), -5.0);
        // Falling edge midpoint is near zero
        let edge = period / 50.0;
        let mid_fall = src.value_at(period * 0.5 + edge / 2.0, false);
        assert!(mid_fall.abs() < 1e-9);
    }

    #[test]
    fn square_never_exceeds_amplitude() {
        let src = PowerSource::square(volt(5.0), hz(100.0)).unwrap();
        for i in 0..1000 {
            let t = i as f64 * 1e-5;
            let v = src.value_at(t, false);
            assert!(v.abs() <= 5.0 + 1e-9, "t={t} v={v}");
        }
    }

    #[test]
    fn zero_frequency_rejected() {
        assert!(PowerSource::sine(volt(1.0), hz(0.0)).is_err());
        assert!(PowerSource::square(volt(1.0), hz(-1.0)).is_err());
    }
}
