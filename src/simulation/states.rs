//! Core particle state shared with the host simulation.
//!
//! Defines the particle record and the locally-held particle set:
//! - `Particle` with `NVec3` position/velocity and mutable force slots
//! - `System` holding the local particles, the active set and the time
//!
//! The host owns this state. Analytic gravity only reads positions,
//! velocities, masses, types and ids, and writes the acceleration and
//! tidal-tensor accumulators (plus the mass, for excision).

use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;

pub type NVec3 = Vector3<f64>;
pub type NMat3 = Matrix3<f64>;

/// Particle type tag, numbered as in the host's type table (0 = gas, 5 = sink)
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParticleType {
    Gas,
    Halo,
    Disk,
    Bulge,
    Star,
    Sink,
}

impl ParticleType {
    /// Host type index (0..=5)
    pub fn index(self) -> u8 {
        match self {
            ParticleType::Gas => 0,
            ParticleType::Halo => 1,
            ParticleType::Disk => 2,
            ParticleType::Bulge => 3,
            ParticleType::Star => 4,
            ParticleType::Sink => 5,
        }
    }

    /// Bit used in type masks such as the grain-type set
    pub fn bit(self) -> u32 {
        1 << self.index()
    }

    pub fn is_anchor(self) -> bool {
        self == ParticleType::Sink
    }
}

/// Id carried by particles that have been logically removed
pub const EXCISED_ID: u64 = 0;

#[derive(Debug, Clone)]
pub struct Particle {
    pub id: u64, // stable id, EXCISED_ID for removed bodies; sinks at most 2^53
    pub ptype: ParticleType, // type tag
    pub position: NVec3, // position
    pub velocity: NVec3, // velocity
    pub predicted_velocity: Option<NVec3>, // drift-predicted velocity (gas only)
    pub mass: f64, // mass, zero once excised
    pub grav_accel: NVec3, // gravitational acceleration accumulator
    pub tidal_tensor: Option<NMat3>, // present only when the host tracks it
    pub anchor_offset: Option<NVec3>, // cached anchor - position
    pub grain_size: Option<f64>, // grain radius for size-dependent forcing
}

impl Particle {
    pub fn new(id: u64, ptype: ParticleType, position: NVec3, velocity: NVec3, mass: f64) -> Self {
        Self {
            id,
            ptype,
            position,
            velocity,
            predicted_velocity: None,
            mass,
            grav_accel: NVec3::zeros(),
            tidal_tensor: None,
            anchor_offset: None,
            grain_size: None,
        }
    }

    /// Enable tidal-tensor tracking for this particle
    pub fn with_tidal_tensor(mut self) -> Self {
        self.tidal_tensor = Some(NMat3::zeros());
        self
    }

    /// Velocity the frame terms should see: the predicted velocity for gas
    /// when the host supplies one, the plain velocity otherwise
    pub fn frame_velocity(&self) -> NVec3 {
        match (self.ptype, self.predicted_velocity) {
            (ParticleType::Gas, Some(v)) => v,
            _ => self.velocity,
        }
    }

    pub fn is_excised(&self) -> bool {
        self.mass == 0.0
    }

    /// Add `d` to the tidal tensor if this particle tracks one
    pub fn add_tidal(&mut self, d: &NMat3) {
        if let Some(t) = self.tidal_tensor.as_mut() {
            *t += d;
        }
    }
}

/// Locally-held particle set of one process
#[derive(Debug, Clone)]
pub struct System {
    pub particles: Vec<Particle>, // local particles
    pub active: Vec<usize>, // indices of force-active particles, host order
    pub t: f64, // time
}

impl System {
    /// All particles active, in storage order
    pub fn new(particles: Vec<Particle>, t: f64) -> Self {
        let active = (0..particles.len()).collect();
        Self { particles, active, t }
    }

    pub fn with_active(particles: Vec<Particle>, active: Vec<usize>, t: f64) -> Self {
        Self { particles, active, t }
    }

    /// Round-robin share of `rank` among `size` processes, all active
    pub fn partition(self, rank: usize, size: usize) -> Self {
        let particles = self
            .particles
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % size.max(1) == rank)
            .map(|(_, p)| p)
            .collect();
        Self::new(particles, self.t)
    }

    /// Number of local particles of type `ptype`
    pub fn count_of(&self, ptype: ParticleType) -> usize {
        self.particles.iter().filter(|p| p.ptype == ptype).count()
    }
}
