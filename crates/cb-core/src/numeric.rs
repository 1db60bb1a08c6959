use crate::CoreError;

/// Floating point type used throughout the simulator
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Check that `v` is finite and lies in `[min, max]`.
pub fn ensure_in_range(v: Real, min: Real, max: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < min || v > max {
        return Err(CoreError::OutOfRange {
            what,
            value: v,
            min,
            max,
        });
    }
    Ok(v)
}

/// Clamp without panicking on inverted bounds or NaN input.
///
/// `f64::clamp` asserts `min <= max`; scenario data is user supplied, so the
/// lower bound wins when the range is inverted. NaN maps to `min`.
pub fn clamp(value: Real, min: Real, max: Real) -> Real {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max.max(min))
}

/// First-order approach of `current` toward `target` with time constant `tau_s`.
///
/// `next = current + (target - current) * (1 - exp(-dt/tau))`.
/// Non-positive `tau_s` or `dt_s` leaves the value untouched.
pub fn smooth_towards(current: Real, target: Real, tau_s: Real, dt_s: Real) -> Real {
    if tau_s <= 0.0 || dt_s <= 0.0 {
        return current;
    }
    let alpha = 1.0 - (-dt_s / tau_s).exp();
    current + (target - current) * alpha
}

/// Linear decay of an effect scalar toward zero over `span_ms`.
pub fn decay_linear(effect: Real, dt_ms: Real, span_ms: Real) -> Real {
    if span_ms <= 0.0 {
        return 0.0;
    }
    (effect - dt_ms / span_ms).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_in_range_rejects_outside() {
        assert!(ensure_in_range(0.5, 0.0, 1.0, "rate").is_ok());
        let err = ensure_in_range(1.5, 0.0, 1.0, "rate").unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { what: "rate", .. }));
    }

    #[test]
    fn clamp_handles_nan_and_inverted_bounds() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(Real::NAN, 2.0, 3.0), 2.0);
        assert_eq!(clamp(10.0, 4.0, 1.0), 4.0);
    }

    #[test]
    fn smooth_towards_one_tau_covers_63_percent() {
        let next = smooth_towards(0.0, 100.0, 10.0, 10.0);
        assert!((next - 63.212).abs() < 1e-2);
    }

    #[test]
    fn smooth_towards_ignores_degenerate_steps() {
        assert_eq!(smooth_towards(5.0, 10.0, 0.0, 1.0), 5.0);
        assert_eq!(smooth_towards(5.0, 10.0, 1.0, 0.0), 5.0);
        assert_eq!(smooth_towards(5.0, 10.0, 1.0, -1.0), 5.0);
    }

    #[test]
    fn decay_linear_reaches_zero() {
        assert!((decay_linear(1.0, 15_000.0, 30_000.0) - 0.5).abs() < 1e-12);
        assert_eq!(decay_linear(0.2, 30_000.0, 30_000.0), 0.0);
        assert_eq!(decay_linear(1.0, 10.0, 0.0), 0.0);
    }
}
