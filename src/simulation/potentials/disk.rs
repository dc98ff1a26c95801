//! Adiabatically growing disk
//!
//! Mass, radial scale and vertical scale are tabulated against time and
//! linearly interpolated once per pass; outside the table the nearest
//! endpoint is held. The force is Miyamoto–Nagai:
//!
//! a_R = -G M R / (R² + (a + Z)²)^(3/2),  a_z = a_R(z) (a + Z) / Z,
//! with Z = sqrt(b² + z²).

use serde::Deserialize;

use crate::error::ConfigError;
use crate::simulation::forces::{AnalyticPotential, ForceContext};
use crate::simulation::states::{Particle, System};

/// Disk parameters at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskParams {
    pub mass: f64,
    pub radius: f64,
    pub height: f64,
}

/// Breakpoint table; `t` must increase strictly
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DiskTable {
    pub t: Vec<f64>,
    pub mass: Vec<f64>,
    pub radius: Vec<f64>,
    pub height: Vec<f64>,
}

impl Default for DiskTable {
    /// Fit to a Milky-Way-mass galaxy, tabulated in scale factor
    fn default() -> Self {
        Self {
            t: vec![0.2, 0.250, 0.266, 0.285, 0.308, 0.333, 0.363, 0.400, 0.444, 0.500, 0.572, 0.667, 0.800, 1.000],
            mass: vec![0.0, 0.061, 0.088, 0.117, 0.153, 0.223, 0.348, 0.429, 0.581, 1.118, 2.004, 3.008, 4.403, 6.001],
            radius: vec![1.0, 5.071, 7.513, 6.787, 6.162, 3.277, 4.772, 3.964, 3.418, 2.511, 2.463, 1.503, 1.005, 1.150],
            height: vec![1.0, 4.185, 8.971, 5.089, 3.532, 3.057, 4.557, 2.117, 1.828, 0.809, 0.217, 0.148, 0.335, 0.404],
        }
    }
}

impl DiskTable {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.t.len();
        if self.mass.len() != n || self.radius.len() != n || self.height.len() != n {
            return Err(ConfigError::DiskTableLength {
                t: n,
                mass: self.mass.len(),
                radius: self.radius.len(),
                height: self.height.len(),
            });
        }
        if n == 0 {
            return Err(ConfigError::EmptyDiskTable);
        }
        if let Some(k) = (1..n).find(|&k| self.t[k] <= self.t[k - 1]) {
            return Err(ConfigError::DiskTableOrder(k));
        }
        Ok(())
    }

    /// Parameters at time `t`. Table must be valid.
    pub fn interpolate(&self, t: f64) -> DiskParams {
        let n = self.t.len();
        let (i0, i1, w) = if t <= self.t[0] {
            (0, 0, 0.0)
        } else if t >= self.t[n - 1] {
            (n - 1, n - 1, 0.0)
        } else {
            let i1 = self.t.iter().position(|&tk| tk > t).unwrap_or(n - 1);
            let i0 = i1 - 1;
            (i0, i1, (t - self.t[i0]) / (self.t[i1] - self.t[i0]))
        };
        let lerp = |col: &[f64]| col[i0] + w * (col[i1] - col[i0]);
        DiskParams {
            mass: lerp(&self.mass),
            radius: lerp(&self.radius),
            height: lerp(&self.height),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct GrowingDisk {
    pub table: DiskTable,
}

impl GrowingDisk {
    #[allow(non_snake_case)]
    fn accelerate_with(&self, disk: &DiskParams, G: f64, ctx: &ForceContext, p: &mut Particle) {
        let Some(d) = ctx.displacement(p) else { return };
        let r2 = d.x * d.x + d.y * d.y;
        let z_term = (disk.height * disk.height + d.z * d.z).sqrt();
        let r_term = disk.radius + z_term;
        let denom = (r2 + r_term * r_term).powf(1.5);
        if denom == 0.0 {
            return;
        }
        let fac = -G * disk.mass / denom;
        p.grav_accel.x += fac * d.x;
        p.grav_accel.y += fac * d.y;
        if z_term > 0.0 {
            p.grav_accel.z += fac * d.z * r_term / z_term;
        }
    }
}

impl AnalyticPotential for GrowingDisk {
    fn name(&self) -> &'static str {
        "growing_disk"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let disk = self.table.interpolate(ctx.t);
        self.accelerate_with(&disk, ctx.params.G, ctx, p);
    }

    // interpolate once per pass
    fn apply(&self, ctx: &ForceContext, sys: &mut System) {
        let disk = self.table.interpolate(ctx.t);
        let System { particles, active, .. } = sys;
        for &i in active.iter() {
            self.accelerate_with(&disk, ctx.params.G, ctx, &mut particles[i]);
        }
    }
}
