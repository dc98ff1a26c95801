//! Point-source potentials

use serde::Deserialize;

use crate::simulation::forces::{AnalyticPotential, Composition, ForceContext};
use crate::simulation::states::{NVec3, Particle, ParticleType};

/// Softened point mass at the potential centre
///
/// a = -G m d / (|d|² + ε²)^(3/2); no contribution at zero separation or
/// inside `min_radius`.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PointMass {
    pub mass: f64,
    pub softening: f64,
    pub min_radius: f64,
}

impl Default for PointMass {
    fn default() -> Self {
        Self {
            mass: 1.0,
            softening: 0.0,
            min_radius: 0.0,
        }
    }
}

impl AnalyticPotential for PointMass {
    fn name(&self) -> &'static str {
        "point_mass"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let Some(d) = ctx.displacement(p) else { return };
        let r2 = d.norm_squared();
        if r2 == 0.0 || r2.sqrt() < self.min_radius {
            return;
        }
        let s2 = r2 + self.softening * self.softening;
        p.grav_accel -= d * (ctx.params.G * self.mass / (s2 * s2.sqrt()));
    }
}

/// Keplerian disk with G = M = 1. Replaces the acceleration of gas
/// particles: it is the only force in the disk test problems.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeplerianDisk;

impl AnalyticPotential for KeplerianDisk {
    fn name(&self) -> &'static str {
        "keplerian"
    }

    fn composition(&self) -> Composition {
        Composition::Overwrite
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        if p.ptype != ParticleType::Gas {
            return;
        }
        let Some(d) = ctx.displacement(p) else { return };
        let r2 = d.norm_squared();
        if r2 != 0.0 {
            p.grav_accel = -d / (r2 * r2.sqrt());
        }
    }
}

/// Bounded 2-D Keplerian field of the Keplerian-disk test problem.
///
/// Inside `inner_radius` the pull is tapered and turns repulsive toward
/// the centre; beyond `outer_radius` it steepens over `taper` so the disk
/// edge stays put. Replaces the acceleration, z component zero.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct KeplerianTestProblem {
    pub centre: [f64; 2],
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub taper: f64,
}

impl Default for KeplerianTestProblem {
    fn default() -> Self {
        Self {
            centre: [4.0, 4.0],
            inner_radius: 0.35,
            outer_radius: 2.1,
            taper: 0.1,
        }
    }
}

impl KeplerianTestProblem {
    /// In-plane acceleration at offset `(dx, dy)` from the centre
    pub fn field(&self, dx: f64, dy: f64) -> [f64; 2] {
        let r = dx.hypot(dy);
        if r == 0.0 {
            return [0.0, 0.0];
        }
        let r3 = r * r * r;
        let scale = if r <= self.inner_radius {
            let q = r / self.inner_radius;
            -(q * q) + (self.inner_radius - r) / self.inner_radius
        } else if r < self.outer_radius {
            -1.0
        } else {
            -(1.0 + (r - self.outer_radius) / self.taper)
        };
        [scale * dx / r3, scale * dy / r3]
    }
}

impl AnalyticPotential for KeplerianTestProblem {
    fn name(&self) -> &'static str {
        "keplerian_test_problem"
    }

    fn composition(&self) -> Composition {
        Composition::Overwrite
    }

    fn accelerate(&self, _ctx: &ForceContext, p: &mut Particle) {
        let [ax, ay] = self.field(p.position.x - self.centre[0], p.position.y - self.centre[1]);
        p.grav_accel = NVec3::new(ax, ay, 0.0);
    }
}

/// Paczynski–Wiita pseudo-Newtonian potential, G = c = 1:
/// a = -M / (r - r_g)² r̂ outside r_g = 2M, nothing inside.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PaczynskiWiita {
    pub mass: f64,
}

impl Default for PaczynskiWiita {
    fn default() -> Self {
        Self { mass: 1.0 }
    }
}

impl AnalyticPotential for PaczynskiWiita {
    fn name(&self) -> &'static str {
        "paczynski_wiita"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let Some(d) = ctx.displacement(p) else { return };
        let r = d.norm();
        let r_g = 2.0 * self.mass;
        if r > r_g {
            let q = self.mass / ((r - r_g) * (r - r_g));
            p.grav_accel -= d * (q / r);
        }
    }
}
