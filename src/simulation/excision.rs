//! Removal of gas falling into a central object
//!
//! The excision boundary follows the free-fall radius of gas bound to a
//! central mass `M`: starting at `R0`, the radius inside which material
//! has had time to fall in grows as
//!
//! R(t) = η (R0³ + 3 √(2GM) R0^(3/2) t + 9/2 G M t²)^(1/3)
//!
//! Gas inside R(t) is given zero mass, which removes it from gravity and
//! hydrodynamics without touching the particle arrays.

use log::debug;
use serde::Deserialize;

use super::forces::ForceContext;
use super::states::{ParticleType, System};

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Excision {
    pub mass: f64, // central mass; zero keeps the boundary fixed
    pub init_radius: f64, // R0
    pub eta: f64, // boundary in units of R(t)
}

impl Default for Excision {
    fn default() -> Self {
        Self {
            mass: 0.0,
            init_radius: 0.0,
            eta: 1.0,
        }
    }
}

impl Excision {
    #[allow(non_snake_case)]
    pub fn radius(&self, G: f64, t: f64) -> f64 {
        let r0 = self.init_radius;
        let gm = G * self.mass;
        let cube = r0 * r0 * r0 + 3.0 * (2.0 * gm).sqrt() * r0.powf(1.5) * t + 4.5 * gm * t * t;
        self.eta * cube.cbrt()
    }

    /// Zero the mass of active gas inside the boundary; returns how many
    /// particles were newly excised.
    pub fn apply(&self, ctx: &ForceContext, sys: &mut System) -> usize {
        let radius = self.radius(ctx.params.G, ctx.t);
        let mut removed = 0;
        let System { particles, active, .. } = sys;
        for &i in active.iter() {
            let p = &mut particles[i];
            if p.ptype != ParticleType::Gas || p.is_excised() {
                continue;
            }
            let Some(d) = ctx.displacement(p) else { continue };
            if d.norm() < radius {
                p.mass = 0.0;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("excised {removed} gas particles inside r = {radius:.6e}");
        }
        removed
    }
}
