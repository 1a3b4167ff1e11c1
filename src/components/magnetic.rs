//! Jiles-Atherton style magnetic core model.
//!
//! The transformer core is driven by `H(t) = H_base * sin(2 pi f t)`. Each
//! field sample moves the magnetization toward the anhysteretic curve
//!
//! ```text
//! He  = H + alpha * M
//! Man = Ms * L(He / a),   L(x) = coth(x) - 1/x
//! ```
//!
//! through an irreversible part (pinning strength `k`, only when the field
//! moves toward `Man`) blended with a reversible fraction `c`. The step is
//! limited so `M` never crosses `Man` within one sample.

use std::collections::VecDeque;
use std::f64::consts::PI;

use crate::circuit::CoreMaterial;

/// Permeability of free space (H/m).
pub const MU_0: f64 = 4.0 * PI * 1e-7;

/// Number of (H, B) points kept for the hysteresis loop.
pub const HISTORY_LEN: usize = 200;

/// Reversible magnetization fraction.
pub const REVERSIBLE_FRACTION: f64 = 0.1;

/// Magnetic properties of a core material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreParams {
    /// Saturation flux density (T)
    pub b_sat: f64,
    /// Coercivity (A/m)
    pub h_c: f64,
    /// Saturation magnetization (A/m)
    pub m_s: f64,
}

impl CoreParams {
    /// Properties for a material.
    pub fn for_material(material: CoreMaterial) -> Self {
        match material {
            CoreMaterial::Ferrite => Self {
                b_sat: 0.4,
                h_c: 20.0,
                m_s: 3e5,
            },
            CoreMaterial::IronPowder => Self {
                b_sat: 1.0,
                h_c: 50.0,
                m_s: 8e5,
            },
            CoreMaterial::SiliconSteel => Self {
                b_sat: 1.5,
                h_c: 10.0,
                m_s: 1.2e6,
            },
        }
    }

    /// Anhysteretic shape parameter (A/m).
    pub fn a(&self) -> f64 {
        (self.h_c / 2.0).max(1e-6)
    }

    /// Pinning strength (A/m).
    pub fn k(&self) -> f64 {
        self.h_c.max(1e-6)
    }

    /// Inter-domain coupling. Half the value at which `alpha * dMan/dHe`
    /// reaches 1 and the core would magnetize itself.
    pub fn alpha(&self) -> f64 {
        0.5 * 3.0 * self.a() / self.m_s.max(1.0)
    }
}

/// Langevin function with a series branch near zero.
pub fn langevin(x: f64) -> f64 {
    if x.abs() < 1e-4 {
        x / 3.0 - x * x * x / 45.0
    } else {
        1.0 / x.tanh() - 1.0 / x
    }
}

/// One driven point of the core.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoreSample {
    /// Applied field (A/m)
    pub h: f64,
    /// Flux density (T)
    pub b: f64,
    /// Magnetization (A/m)
    pub m: f64,
}

/// Magnetic core state carried between ticks.
#[derive(Debug, Clone)]
pub struct MagneticCore {
    material: CoreMaterial,
    params: CoreParams,
    magnetization: f64,
    prev_h: f64,
    last: CoreSample,
    history: VecDeque<(f64, f64)>,
}

impl MagneticCore {
    /// Create a demagnetized core.
    pub fn new(material: CoreMaterial) -> Self {
        Self {
            material,
            params: CoreParams::for_material(material),
            magnetization: 0.0,
            prev_h: 0.0,
            last: CoreSample::default(),
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    /// Core material.
    pub fn material(&self) -> CoreMaterial {
        self.material
    }

    /// Material properties in use.
    pub fn params(&self) -> &CoreParams {
        &self.params
    }

    /// Switch material. The magnetic state is kept but clamped to the new
    /// saturation magnetization.
    pub fn set_material(&mut self, material: CoreMaterial) {
        self.material = material;
        self.params = CoreParams::for_material(material);
        self.magnetization = self.magnetization.clamp(-self.params.m_s, self.params.m_s);
    }

    /// Demagnetize and clear the loop history.
    pub fn reset(&mut self) {
        self.magnetization = 0.0;
        self.prev_h = 0.0;
        self.last = CoreSample::default();
        self.history.clear();
    }

    /// Apply field `h` and return the resulting operating point.
    pub fn drive(&mut self, h: f64) -> CoreSample {
        if !h.is_finite() {
            return self.last;
        }
        let p = self.params;
        let a = p.a();
        let alpha = p.alpha();
        let c = REVERSIBLE_FRACTION;

        let dh = h - self.prev_h;
        let m = self.magnetization;
        let man = p.m_s * langevin((h + alpha * m) / a);
        let diff = man - m;

        if dh != 0.0 && diff != 0.0 {
            let delta = dh.signum();
            // Irreversible motion only follows the field toward Man
            let irreversible = if delta * diff > 0.0 {
                let den = delta * p.k() - alpha * diff;
                if den.abs() < 1e-6 {
                    0.0
                } else {
                    (dh / den).abs()
                }
            } else {
                0.0
            };
            let reversible = dh.abs() / a;
            let fraction = ((1.0 - c) * irreversible + c * reversible).min(1.0);
            self.magnetization = (m + fraction * diff).clamp(-p.m_s, p.m_s);
        }

        let b = (MU_0 * (h + self.magnetization)).clamp(-p.b_sat, p.b_sat);
        self.prev_h = h;
        self.last = CoreSample {
            h,
            b,
            m: self.magnetization,
        };

        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back((h, b));
        self.last
    }

    /// Drive the core with `H_base * sin(2 pi f t)` over a time vector.
    pub fn drive_sine(&mut self, h_base: f64, frequency: f64, time: &[f64]) -> Vec<CoreSample> {
        time.iter()
            .map(|&t| self.drive(h_base * (2.0 * PI * frequency * t).sin()))
            .collect()
    }

    /// Latest operating point.
    pub fn last(&self) -> CoreSample {
        self.last
    }

    /// Magnetization (A/m).
    pub fn magnetization(&self) -> f64 {
        self.magnetization
    }

    /// |B| as a percentage of the saturation flux density.
    pub fn saturation_percent(&self) -> f64 {
        (self.last.b.abs() / self.params.b_sat * 100.0).clamp(0.0, 100.0)
    }

    /// Recorded (H, B) pairs, oldest first.
    pub fn history(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.history.iter().copied()
    }

    /// Number of recorded points.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn time(n: usize, dt: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * dt).collect()
    }

    #[test]
    fn test_langevin_branches_agree() {
        assert_relative_eq!(langevin(0.0), 0.0);
        assert_relative_eq!(langevin(1e-4 * 0.999), langevin(1e-4 * 1.001), epsilon = 1e-7);
        assert!(langevin(50.0) < 1.0 && langevin(50.0) > 0.97);
        assert_relative_eq!(langevin(-2.0), -langevin(2.0));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut core = MagneticCore::new(CoreMaterial::Ferrite);
        core.drive_sine(100.0, 1000.0, &time(1000, 1e-4));
        assert_eq!(core.history_len(), HISTORY_LEN);
    }

    #[test]
    fn test_flux_within_saturation() {
        for material in [
            CoreMaterial::Ferrite,
            CoreMaterial::IronPowder,
            CoreMaterial::SiliconSteel,
        ] {
            let mut core = MagneticCore::new(material);
            let b_sat = core.params().b_sat;
            for s in core.drive_sine(5000.0, 50.0, &time(2000, 1e-4)) {
                assert!(s.b.is_finite() && s.b.abs() <= b_sat);
                assert!(s.m.abs() <= core.params().m_s);
            }
            assert!(core.saturation_percent() <= 100.0);
        }
    }

    #[test]
    fn test_loop_has_remanence() {
        let mut core = MagneticCore::new(CoreMaterial::Ferrite);
        // Drive up to saturation then return to zero field
        for i in 0..=100 {
            core.drive(200.0 * i as f64 / 100.0);
        }
        for i in (0..=100).rev() {
            core.drive(200.0 * i as f64 / 100.0);
        }
        assert!(core.magnetization() > 0.0, "remanent M = {}", core.magnetization());
    }

    #[test]
    fn test_odd_symmetry_after_settling() {
        let mut core = MagneticCore::new(CoreMaterial::SiliconSteel);
        let samples = core.drive_sine(100.0, 100.0, &time(2000, 1e-4));
        // One full period, well after the initial magnetization curve
        let last_period = &samples[1500..1600];
        let b_max = last_period.iter().map(|s| s.b).fold(f64::MIN, f64::max);
        let b_min = last_period.iter().map(|s| s.b).fold(f64::MAX, f64::min);
        assert!(b_max > 0.0);
        assert_relative_eq!(b_max, -b_min, max_relative = 0.05);
    }

    #[test]
    fn test_reset_demagnetizes() {
        let mut core = MagneticCore::new(CoreMaterial::IronPowder);
        core.drive_sine(100.0, 1000.0, &time(100, 1e-4));
        core.reset();
        assert_eq!(core.magnetization(), 0.0);
        assert_eq!(core.history_len(), 0);
    }

    #[test]
    fn test_non_finite_field_is_ignored() {
        let mut core = MagneticCore::new(CoreMaterial::Ferrite);
        core.drive(50.0);
        let before = core.last();
        for h in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(core.drive(h), before);
        }
        assert_eq!(core.magnetization(), before.m);
        assert_eq!(core.history_len(), 1);
        let next = core.drive(60.0);
        assert!(next.m.is_finite() && next.b.is_finite());
    }
}
