//! Operational Amplifier model.
//!
//! Finite-gain saturating model used inside the active filter:
//! Vout = clamp(A * (Vin - Vout_prev), -Vmax, Vmax).

/// Parameters for an op-amp model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpAmpParams {
    /// Open-loop DC gain (A_OL)
    pub gain: f64,
    /// Output saturation magnitude (V)
    pub v_max: f64,
}

impl Default for OpAmpParams {
    fn default() -> Self {
        Self {
            gain: 1000.0,
            v_max: 1000.0,
        }
    }
}

impl OpAmpParams {
    /// Clamp `v` to the output swing.
    pub fn saturate(&self, v: f64) -> f64 {
        let limit = self.v_max.abs();
        v.clamp(-limit, limit)
    }

    /// Output for input `v_in` given the previous output `v_out_prev`.
    pub fn output(&self, v_in: f64, v_out_prev: f64) -> f64 {
        self.saturate(self.gain * (v_in - v_out_prev))
    }

    /// Settled output of a unity-feedback follower: A / (1 + A) * Vin,
    /// limited to the output swing.
    pub fn follower(&self, v_in: f64) -> f64 {
        let a = self.gain.max(0.0);
        self.saturate(a / (1.0 + a) * v_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rails() -> OpAmpParams {
        OpAmpParams {
            gain: 2e5,
            v_max: 14.5,
        }
    }

    #[test]
    fn test_opamp_linear_region() {
        let op = OpAmpParams::default();
        assert_relative_eq!(op.output(1.001, 1.0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_opamp_saturates() {
        let op = rails();
        assert_relative_eq!(op.output(10.0, 0.0), 14.5);
        assert_relative_eq!(op.output(-10.0, 0.0), -14.5);
    }

    #[test]
    fn test_follower_settles_to_input() {
        let op = OpAmpParams::default();
        assert_relative_eq!(op.follower(100.0), 100.0 * 1000.0 / 1001.0);
        assert_relative_eq!(rails().follower(100.0), 14.5);
        assert_relative_eq!(rails().follower(-100.0), -14.5);
    }
}
