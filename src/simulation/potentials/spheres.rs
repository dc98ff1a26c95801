//! Static spherical profiles
//!
//! Each profile is an enclosed-mass law M(r) applied as
//! a = -G M(r) d / r³ about the potential centre. Plummer and Hernquist
//! also add the analytic tidal tensor ∂a_k/∂x_j when the particle tracks one.

use serde::Deserialize;

use crate::simulation::forces::{AnalyticPotential, ForceContext};
use crate::simulation::states::{NMat3, Particle};

/// Plummer sphere, a = -G M d / (r² + a²)^(3/2)
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Plummer {
    pub mass: f64,
    pub scale: f64,
}

impl Default for Plummer {
    fn default() -> Self {
        Self { mass: 1.0, scale: 1.0 }
    }
}

impl AnalyticPotential for Plummer {
    fn name(&self) -> &'static str {
        "plummer"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let Some(d) = ctx.displacement(p) else { return };
        let s2 = d.norm_squared() + self.scale * self.scale;
        if s2 == 0.0 {
            return;
        }
        let gm = ctx.params.G * self.mass;
        let f = s2 * s2.sqrt();
        p.grav_accel -= d * (gm / f);

        if p.tidal_tensor.is_some() {
            let f2 = f * s2;
            let t = (d * d.transpose()) * (3.0 * gm / f2) - NMat3::identity() * (gm / f);
            p.add_tidal(&t);
        }
    }
}

/// Hernquist profile, M(r) = M r² / (r + a)²
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Hernquist {
    pub mass: f64,
    pub scale: f64,
}

impl Default for Hernquist {
    fn default() -> Self {
        Self { mass: 100.0, scale: 20.0 }
    }
}

impl AnalyticPotential for Hernquist {
    fn name(&self) -> &'static str {
        "hernquist"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let Some(d) = ctx.displacement(p) else { return };
        let r2 = d.norm_squared();
        if r2 == 0.0 {
            return;
        }
        let r = r2.sqrt();
        let f = r + self.scale;
        let m = self.mass * (r / f) * (r / f);
        p.grav_accel -= d * (ctx.params.G * m / (r2 * r));

        if p.tidal_tensor.is_some() {
            let f0 = ctx.params.G * self.mass;
            let fa = f0 * (2.0 / f + 1.0 / r) / (r2 * f * f);
            let fxx = -f0 / (r * f * f);
            let t = (d * d.transpose()) * fa + NMat3::identity() * fxx;
            p.add_tidal(&t);
        }
    }
}

/// Singular isothermal sphere truncated at `r_max`: M(r) grows linearly
/// to `mass_max` at `r_max` and stays constant beyond.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct IsothermalSphere {
    pub mass_max: f64,
    pub r_max: f64,
}

impl Default for IsothermalSphere {
    fn default() -> Self {
        Self { mass_max: 100.0, r_max: 200.0 }
    }
}

impl AnalyticPotential for IsothermalSphere {
    fn name(&self) -> &'static str {
        "isothermal_sphere"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let Some(d) = ctx.displacement(p) else { return };
        let r2 = d.norm_squared();
        if r2 == 0.0 {
            return;
        }
        let r = r2.sqrt();
        let m = if r < self.r_max { self.mass_max * r / self.r_max } else { self.mass_max };
        p.grav_accel -= d * (ctx.params.G * m / (r2 * r));
    }
}

/// NFW halo of mass `m200` and concentration `concentration`.
///
/// R200 is where the mean enclosed density is 200 times critical, so it
/// follows from `m200`, G and the Hubble constant; Rs = R200 / c.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Nfw {
    pub m200: f64,
    pub concentration: f64,
}

impl Default for Nfw {
    fn default() -> Self {
        Self { m200: 100.0, concentration: 10.0 }
    }
}

/// Below this x = r/Rs the mass factor uses its series expansion
pub const NFW_SERIES_CUTOFF: f64 = 0.04;

/// (ln(1+x) - x/(1+x)) / x², which loses precision at small x
pub fn nfw_mass_factor_exact(x: f64) -> f64 {
    ((1.0 + x).ln() - x / (1.0 + x)) / (x * x)
}

/// Second-order expansion of [`nfw_mass_factor_exact`] about x = 0
pub fn nfw_mass_factor_series(x: f64) -> f64 {
    0.5 - 2.0 * x / 3.0 + 0.75 * x * x
}

pub fn nfw_mass_factor(x: f64) -> f64 {
    if x <= NFW_SERIES_CUTOFF {
        nfw_mass_factor_series(x)
    } else {
        nfw_mass_factor_exact(x)
    }
}

impl Nfw {
    /// Scale radius Rs for gravitational constant `g` and Hubble constant `h0`
    #[allow(non_snake_case)]
    pub fn scale_radius(&self, G: f64, h0: f64) -> f64 {
        let r200 = (self.m200 * G / (100.0 * h0 * h0)).cbrt();
        r200 / self.concentration
    }
}

impl AnalyticPotential for Nfw {
    fn name(&self) -> &'static str {
        "nfw"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let Some(d) = ctx.displacement(p) else { return };
        let r = d.norm();
        if r <= 0.0 {
            return;
        }
        let g = ctx.params.G;
        let rs = self.scale_radius(g, ctx.params.hubble_h0);
        let c = self.concentration;
        let cfac = (1.0 + c).ln() - c / (1.0 + c);
        let mfac = nfw_mass_factor(r / rs);
        p.grav_accel -= d * (g * mfac * self.m200 / (cfac * rs * rs) / r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nfw_mass_factor_limits() {
        assert_relative_eq!(nfw_mass_factor(0.0), 0.5);
        let x = 3.0_f64;
        assert_relative_eq!(nfw_mass_factor(x), ((4.0_f64).ln() - 0.75) / 9.0, epsilon = 1e-14);
    }

    #[test]
    fn nfw_scale_radius_follows_virial_definition() {
        let nfw = Nfw { m200: 100.0, concentration: 10.0 };
        // R200 = (100 G / (100 h0²))^(1/3) = 1 for G = h0 = 1
        assert_relative_eq!(nfw.scale_radius(1.0, 1.0), 0.1, epsilon = 1e-14);
    }
}
