//! Small-signal stability of the filter and regulator chain.
//!
//! The chain is approximated by a rational transfer function
//! `G(s) = num(s) / den(s)` (coefficients in descending powers of `s`):
//!
//! | Filter      | G(s)                          |
//! |-------------|-------------------------------|
//! | capacitive  | 1 / (RC s + 1)                |
//! | inductive   | 1 / (LC s^2 + (L/R) s + 1)    |
//! | active      | A / (tau s + 1)               |
//!
//! For the active filter `A` is the op-amp gain (at most 1e6) scaled by the
//! regulator: `Vref` for a linear regulator, the steady duty cycle for a
//! switching one. Every coefficient is floored at 1e-6 so the function is
//! never degenerate.
//!
//! The root locus solves `den(s) + k num(s) = 0` for each gain `k` through
//! the eigenvalues of the companion matrix.

use std::f64::consts::{PI, SQRT_2};

use nalgebra::linalg::Schur;
use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::circuit::{CircuitConfiguration, FilterKind, RegulatorKind};

use super::spectrum::{linspace, logspace};

/// Default number of Bode/Nyquist points.
pub const DEFAULT_BODE_POINTS: usize = 1000;

/// Default number of root-locus gain steps.
pub const DEFAULT_LOCUS_GAINS: usize = 1000;

/// Largest root-locus gain.
pub const MAX_LOCUS_GAIN: f64 = 100.0;

/// Floor applied to every transfer function coefficient.
pub const MIN_COEFFICIENT: f64 = 1e-6;

/// Ceiling on the op-amp gain used in the model.
pub const MAX_OPAMP_GAIN: f64 = 1e6;

/// Iteration limit of the eigenvalue solver.
const MAX_SCHUR_ITERATIONS: usize = 1000;

/// Rational transfer function with coefficients in descending powers of s.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    /// Numerator coefficients
    pub num: Vec<f64>,
    /// Denominator coefficients
    pub den: Vec<f64>,
}

impl TransferFunction {
    /// Create a transfer function, flooring every coefficient.
    pub fn new(num: Vec<f64>, den: Vec<f64>) -> Self {
        let floor = |c: Vec<f64>| -> Vec<f64> {
            c.into_iter()
                .map(|x| if x.is_finite() { x.max(MIN_COEFFICIENT) } else { MIN_COEFFICIENT })
                .collect()
        };
        Self {
            num: floor(num),
            den: floor(den),
        }
    }

    /// Model of the filter and regulator chain of a configuration.
    pub fn for_configuration(config: &CircuitConfiguration) -> Self {
        let r = (config.load_resistance + config.parasitic_resistance).max(MIN_COEFFICIENT);

        match config.filter {
            FilterKind::Capacitive { capacitance } => {
                Self::new(vec![1.0], vec![r * capacitance.max(1e-9), 1.0])
            }
            FilterKind::Inductive { inductance } => {
                // Reservoir capacitor value is kept even while the filter is inductive
                let c = config.numeric("capacitance").unwrap_or(0.0).max(1e-9);
                let l = inductance.max(MIN_COEFFICIENT);
                Self::new(vec![1.0], vec![l * c, l / r, 1.0])
            }
            FilterKind::Active { cutoff } => {
                let tau = 1.0 / (2.0 * PI * cutoff.max(1.0));
                let a = config.devices.opamp.gain.min(MAX_OPAMP_GAIN);
                let scale = match config.regulator {
                    RegulatorKind::None => 1.0,
                    RegulatorKind::Linear { vref } => vref.max(1e-3),
                    RegulatorKind::Switching { vref, .. } => {
                        let v_in = (config.input_voltage * config.turns_ratio * SQRT_2).max(1e-3);
                        (vref / v_in).min(1.0)
                    }
                };
                Self::new(vec![a * scale], vec![tau, 1.0])
            }
        }
    }

    /// Evaluate G(s).
    pub fn evaluate(&self, s: Complex64) -> Complex64 {
        let horner = |c: &[f64]| {
            c.iter()
                .fold(Complex64::new(0.0, 0.0), |acc, &x| acc * s + x)
        };
        let den = horner(&self.den);
        if den.norm() == 0.0 {
            return Complex64::new(0.0, 0.0);
        }
        horner(&self.num) / den
    }

    /// Frequency response G(j omega).
    pub fn response(&self, omega: f64) -> Complex64 {
        self.evaluate(Complex64::new(0.0, omega))
    }

    /// Order of the denominator.
    pub fn order(&self) -> usize {
        self.den.len().saturating_sub(1)
    }
}

/// One point of the Bode plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodePoint {
    /// Angular frequency (rad/s)
    pub omega: f64,
    /// 20 log10 |G| (dB)
    pub magnitude_db: f64,
    /// Unwrapped phase (degrees)
    pub phase_deg: f64,
}

/// Bode magnitude and unwrapped phase.
pub fn bode(tf: &TransferFunction, omegas: &[f64]) -> Vec<BodePoint> {
    let mut out: Vec<BodePoint> = Vec::with_capacity(omegas.len());
    for &omega in omegas {
        let h = tf.response(omega);
        let magnitude_db = 20.0 * h.norm().max(1e-300).log10();
        let mut phase_deg = h.arg().to_degrees();
        if let Some(prev) = out.last() {
            while phase_deg - prev.phase_deg > 180.0 {
                phase_deg -= 360.0;
            }
            while phase_deg - prev.phase_deg < -180.0 {
                phase_deg += 360.0;
            }
        }
        out.push(BodePoint {
            omega,
            magnitude_db,
            phase_deg,
        });
    }
    out
}

/// Nyquist locus (Re G, Im G).
pub fn nyquist(tf: &TransferFunction, omegas: &[f64]) -> Vec<(f64, f64)> {
    omegas
        .iter()
        .map(|&omega| {
            let h = tf.response(omega);
            (h.re, h.im)
        })
        .collect()
}

/// Gain and phase margins. A margin is absent when its crossover is not
/// inside the swept band.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    /// Gain margin (dB) at the -180 degree crossover
    pub gain_margin_db: Option<f64>,
    /// Phase margin (degrees) at the 0 dB crossover
    pub phase_margin_deg: Option<f64>,
    /// Frequency of the -180 degree crossover (rad/s)
    pub phase_crossover: Option<f64>,
    /// Frequency of the 0 dB crossover (rad/s)
    pub gain_crossover: Option<f64>,
}

fn interpolate(x0: f64, x1: f64, y0: f64, y1: f64, y: f64) -> f64 {
    if (y1 - y0).abs() < f64::EPSILON {
        x0
    } else {
        x0 + (y - y0) * (x1 - x0) / (y1 - y0)
    }
}

/// Margins read from a Bode sweep.
pub fn margins(points: &[BodePoint]) -> Margins {
    let mut result = Margins::default();
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        if result.phase_margin_deg.is_none() && a.magnitude_db >= 0.0 && b.magnitude_db < 0.0 {
            let u = interpolate(0.0, 1.0, a.magnitude_db, b.magnitude_db, 0.0);
            result.gain_crossover = Some(a.omega + u * (b.omega - a.omega));
            result.phase_margin_deg = Some(180.0 + a.phase_deg + u * (b.phase_deg - a.phase_deg));
        }
        if result.gain_margin_db.is_none() && a.phase_deg > -180.0 && b.phase_deg <= -180.0 {
            let u = interpolate(0.0, 1.0, a.phase_deg, b.phase_deg, -180.0);
            result.phase_crossover = Some(a.omega + u * (b.omega - a.omega));
            result.gain_margin_db = Some(-(a.magnitude_db + u * (b.magnitude_db - a.magnitude_db)));
        }
    }
    result
}

/// Roots of a polynomial given in descending powers.
///
/// Returns `None` when the eigenvalue solver does not converge.
pub fn polynomial_roots(coefficients: &[f64]) -> Option<Vec<Complex64>> {
    let start = coefficients
        .iter()
        .position(|c| c.abs() > f64::EPSILON)
        .unwrap_or(coefficients.len());
    let c = &coefficients[start..];
    let degree = c.len().saturating_sub(1);
    match degree {
        0 => Some(Vec::new()),
        1 => Some(vec![Complex64::new(-c[1] / c[0], 0.0)]),
        n => {
            let mut companion = DMatrix::<f64>::zeros(n, n);
            for j in 0..n {
                companion[(0, j)] = -c[j + 1] / c[0];
            }
            for i in 1..n {
                companion[(i, i - 1)] = 1.0;
            }
            let schur = Schur::try_new(companion, f64::EPSILON, MAX_SCHUR_ITERATIONS)?;
            Some(schur.complex_eigenvalues().iter().copied().collect())
        }
    }
}

/// Closed-loop poles at one gain.
#[derive(Debug, Clone, PartialEq)]
pub struct LocusPoint {
    /// Loop gain k
    pub gain: f64,
    /// Roots of den(s) + k num(s)
    pub poles: Vec<Complex64>,
}

/// Root locus over `gains`. Gains where the solver fails are left out.
pub fn root_locus(tf: &TransferFunction, gains: &[f64]) -> Vec<LocusPoint> {
    let len = tf.den.len().max(tf.num.len());
    let pad = |c: &[f64]| {
        let mut v = vec![0.0; len - c.len()];
        v.extend_from_slice(c);
        v
    };
    let den = pad(&tf.den);
    let num = pad(&tf.num);

    let mut failures = 0usize;
    let locus: Vec<LocusPoint> = gains
        .iter()
        .filter_map(|&k| {
            let characteristic: Vec<f64> = den.iter().zip(&num).map(|(d, n)| d + k * n).collect();
            match polynomial_roots(&characteristic) {
                Some(poles) => Some(LocusPoint { gain: k, poles }),
                None => {
                    failures += 1;
                    None
                }
            }
        })
        .collect();
    if failures > 0 {
        tracing::warn!(failures, "root locus eigenvalue solver did not converge");
    }
    locus
}

/// Full stability picture of a configuration.
#[derive(Debug, Clone)]
pub struct StabilityReport {
    /// Model being analyzed
    pub transfer_function: TransferFunction,
    /// Bode sweep
    pub bode: Vec<BodePoint>,
    /// Nyquist locus
    pub nyquist: Vec<(f64, f64)>,
    /// Critical point of the Nyquist criterion
    pub critical_point: (f64, f64),
    /// Gain and phase margins
    pub margins: Margins,
    /// Root locus
    pub root_locus: Vec<LocusPoint>,
}

/// Bode, Nyquist, margins and root locus over omega in [1, 1e5] rad/s and
/// k in [0, 100].
pub fn analyze_stability(
    config: &CircuitConfiguration,
    bode_points: usize,
    locus_gains: usize,
) -> StabilityReport {
    let _span = tracing::debug_span!("stability", filter = %config.filter).entered();
    let tf = TransferFunction::for_configuration(config);
    let omegas = logspace(1.0, 1e5, bode_points);
    let bode_sweep = bode(&tf, &omegas);
    let margins = margins(&bode_sweep);
    let locus = root_locus(&tf, &linspace(0.0, MAX_LOCUS_GAIN, locus_gains));
    tracing::debug!(
        gain_margin = ?margins.gain_margin_db,
        phase_margin = ?margins.phase_margin_deg,
        "stability analyzed"
    );
    StabilityReport {
        nyquist: nyquist(&tf, &omegas),
        transfer_function: tf,
        bode: bode_sweep,
        critical_point: (-1.0, 0.0),
        margins,
        root_locus: locus,
    }
}
