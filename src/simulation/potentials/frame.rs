//! Frame terms and uniform test fields
//!
//! These act in box coordinates rather than about a potential centre.

use serde::Deserialize;

use crate::simulation::forces::{AnalyticPotential, Composition, ForceContext};
use crate::simulation::states::{Particle, ParticleType};

/// Shearing-sheet approximation: tidal (centrifugal) and Coriolis terms
/// in a frame rotating at `omega` about the box centre, plus vertical
/// gravity for a stratified box.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ShearingSheet {
    pub q: f64, // shear parameter
    pub omega: f64, // angular frequency at the box centre
    pub phi_axis: usize, // azimuthal coordinate, 1 or 2
    pub stratified: bool, // add -Ω² (z - z_c)
}

impl Default for ShearingSheet {
    fn default() -> Self {
        Self {
            q: 1.5,
            omega: 1.0,
            phi_axis: 1,
            stratified: false,
        }
    }
}

impl AnalyticPotential for ShearingSheet {
    fn name(&self) -> &'static str {
        "shearing_sheet"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let om = self.omega;
        let half = ctx.params.box_half;
        let v = p.frame_velocity();

        p.grav_accel.x += 2.0 * (p.position.x - half.x) * self.q * om * om;
        p.grav_accel.x += 2.0 * v[self.phi_axis] * om;
        p.grav_accel[self.phi_axis] -= 2.0 * v.x * om;
        if self.stratified {
            p.grav_accel.z -= om * om * (p.position.z - half.z);
        }
    }
}

/// Constant downward field of the Rayleigh–Taylor test; sets the y
/// component of every particle with a nonzero id.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RayleighTaylor {
    pub g: f64,
}

impl Default for RayleighTaylor {
    fn default() -> Self {
        Self { g: 0.5 }
    }
}

impl AnalyticPotential for RayleighTaylor {
    fn name(&self) -> &'static str {
        "rayleigh_taylor"
    }

    fn composition(&self) -> Composition {
        Composition::Overwrite
    }

    fn accelerate(&self, _ctx: &ForceContext, p: &mut Particle) {
        if p.id != 0 {
            p.grav_accel.y = -self.g;
        }
    }
}

/// Dusty-box field of the grain radiation-driven-instability tests.
///
/// Gas and grains feel vertical gravity along `axis`; grains additionally
/// feel a radiative acceleration tilted by `grain_accel_angle` degrees
/// toward +x. In an unstratified shearing box the problem is solved in
/// the free-falling frame, where only the gas-grain differential remains,
/// and gas also feels the radial pressure-gradient acceleration.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RdiTestProblem {
    pub vertical_gravity: f64,
    pub dust_to_gas: f64,
    pub pressure_gradient_accel: f64,
    pub grain_accel: f64,
    pub grain_accel_angle: f64, // degrees from the vertical axis
    pub axis: usize, // vertical direction
    pub grain_types: Vec<ParticleType>,
    pub grain_size_max: Option<f64>, // scale grain_accel by size_max / size, for size > 0
    pub explicit_radiation: bool, // grain acceleration computed elsewhere
    #[serde(skip)]
    pub shearing_box: bool,
    #[serde(skip)]
    pub stratified_box: bool,
}

impl Default for RdiTestProblem {
    fn default() -> Self {
        Self {
            vertical_gravity: 0.0,
            dust_to_gas: 0.01,
            pressure_gradient_accel: 0.0,
            grain_accel: 0.0,
            grain_accel_angle: 0.0,
            axis: 2,
            grain_types: vec![ParticleType::Bulge],
            grain_size_max: None,
            explicit_radiation: false,
            shearing_box: false,
            stratified_box: false,
        }
    }
}

impl RdiTestProblem {
    fn is_grain(&self, ptype: ParticleType) -> bool {
        self.grain_types.contains(&ptype)
    }
}

impl AnalyticPotential for RdiTestProblem {
    fn name(&self) -> &'static str {
        "rdi_test_problem"
    }

    fn accelerate(&self, _ctx: &ForceContext, p: &mut Particle) {
        let gas = p.ptype == ParticleType::Gas;
        let grain = self.is_grain(p.ptype);
        if p.id == 0 || !(gas || grain) {
            return;
        }

        if self.shearing_box && !self.stratified_box {
            let mu_g = self.vertical_gravity / (1.0 + self.dust_to_gas);
            if gas {
                p.grav_accel[self.axis] += self.dust_to_gas * mu_g;
            } else {
                p.grav_accel[self.axis] -= mu_g;
            }
        } else {
            p.grav_accel[self.axis] -= self.vertical_gravity;
        }
        if self.shearing_box && gas {
            p.grav_accel.x += self.pressure_gradient_accel;
        }

        if grain {
            let mut acc = if self.explicit_radiation { 0.0 } else { self.grain_accel };
            if let (Some(size_max), Some(size)) = (self.grain_size_max, p.grain_size) {
                if size > 0.0 {
                    acc *= size_max / size;
                }
            }
            let theta = self.grain_accel_angle.to_radians();
            p.grav_accel[self.axis] += acc * theta.cos();
            p.grav_accel.x += acc * theta.sin();
        }
    }
}
