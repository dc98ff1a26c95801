//! Configuration types for loading analytic-gravity scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`GravityConfig`]    – which catalog entries run, and with which parameters
//! - [`ParametersConfig`] – physical constants, box geometry, centring
//! - [`ParticleConfig`]   – initial state of each locally-held particle
//! - [`ScenarioConfig`]   – top-level wrapper
//!
//! # YAML format
//!
//! ```yaml
//! gravity:
//!   point_anchor:
//!     model: binary
//!     softening: 0.0
//!   frame:
//!     shearing_sheet: { q: 1.5, omega: 1.0 }
//!   binary_diagnostics:
//!     torques: true
//!     sink_feedback: true
//!
//! parameters:
//!   G: 1.0
//!   self_gravity: false
//!   centre: origin          # origin | box | anchor
//!   box_size: [8.0, 8.0, 8.0]
//!   periodic: false
//!   time: 0.0
//!
//! particles:
//!   - { id: 1, type: sink, x: [-0.5, 0, 0], v: [0, -0.7, 0], m: 0.5 }
//!   - { id: 2, type: sink, x: [ 0.5, 0, 0], v: [0,  0.7, 0], m: 0.5 }
//!   - { id: 3, type: gas,  x: [ 3.0, 0, 0], v: [0,  0.57, 0], m: 1.0e-3 }
//! ```
//!
//! Model blocks are tagged with `model:`; every parameter has the default
//! of the published test problem it comes from.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, GravityError};
use crate::simulation::binary::{BinaryDiagnostics, BinaryOrbit};
use crate::simulation::excision::Excision;
use crate::simulation::params::Centre;
use crate::simulation::potentials::{
    GrowingDisk, Hernquist, IsothermalSphere, KeplerianTestProblem, Nfw, PaczynskiWiita, Plummer,
    PointMass, RayleighTaylor, RdiTestProblem, ShearingSheet,
};
use crate::simulation::states::ParticleType;

/// Point-source model anchored at the potential centre or the binary
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum PointAnchorConfig {
    PointMass(PointMass),
    Keplerian,
    KeplerianTestProblem(KeplerianTestProblem),
    PaczynskiWiita(PaczynskiWiita),
    Binary(BinaryOrbit),
}

/// Extended mass distribution
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ExtendedConfig {
    Plummer(Plummer),
    Hernquist(Hernquist),
    IsothermalSphere(IsothermalSphere),
    Nfw(Nfw),
    GrowingDisk(GrowingDisk),
}

/// Frame terms and uniform test fields; each independently optional
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FrameConfig {
    pub shearing_sheet: Option<ShearingSheet>,
    pub rdi: Option<RdiTestProblem>,
    pub rayleigh_taylor: Option<RayleighTaylor>,
}

/// Selection of analytic gravity terms
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct GravityConfig {
    pub point_anchor: Option<PointAnchorConfig>, // zero or one point-source model
    pub extended: Option<ExtendedConfig>, // zero or one extended model
    pub frame: FrameConfig, // frame terms
    pub excision: Option<Excision>, // gas removal near the centre
    pub binary_diagnostics: Option<BinaryDiagnostics>, // needs the binary model
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

impl GravityConfig {
    pub fn uses_binary(&self) -> bool {
        matches!(self.point_anchor, Some(PointAnchorConfig::Binary(_)))
    }

    /// Check every selected model's parameters; run once at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.point_anchor {
            Some(PointAnchorConfig::PointMass(m)) => {
                non_negative("point_mass.mass", m.mass)?;
                non_negative("point_mass.softening", m.softening)?;
                non_negative("point_mass.min_radius", m.min_radius)?;
            }
            Some(PointAnchorConfig::KeplerianTestProblem(k)) => {
                positive("keplerian_test_problem.inner_radius", k.inner_radius)?;
                positive("keplerian_test_problem.outer_radius", k.outer_radius)?;
                positive("keplerian_test_problem.taper", k.taper)?;
            }
            Some(PointAnchorConfig::PaczynskiWiita(pw)) => positive("paczynski_wiita.mass", pw.mass)?,
            Some(PointAnchorConfig::Binary(b)) => non_negative("binary.softening", b.softening)?,
            Some(PointAnchorConfig::Keplerian) | None => {}
        }

        match &self.extended {
            Some(ExtendedConfig::Plummer(m)) => {
                non_negative("plummer.mass", m.mass)?;
                positive("plummer.scale", m.scale)?;
            }
            Some(ExtendedConfig::Hernquist(m)) => {
                non_negative("hernquist.mass", m.mass)?;
                positive("hernquist.scale", m.scale)?;
            }
            Some(ExtendedConfig::IsothermalSphere(m)) => {
                non_negative("isothermal_sphere.mass_max", m.mass_max)?;
                positive("isothermal_sphere.r_max", m.r_max)?;
            }
            Some(ExtendedConfig::Nfw(m)) => {
                positive("nfw.m200", m.m200)?;
                positive("nfw.concentration", m.concentration)?;
            }
            Some(ExtendedConfig::GrowingDisk(d)) => d.table.validate()?,
            None => {}
        }

        if let Some(s) = &self.frame.shearing_sheet {
            if !(1..=2).contains(&s.phi_axis) {
                return Err(ConfigError::InvalidAxis(s.phi_axis));
            }
        }
        if let Some(r) = &self.frame.rdi {
            if r.axis > 2 {
                return Err(ConfigError::InvalidAxis(r.axis));
            }
            if let Some(s) = r.grain_size_max {
                positive("rdi.grain_size_max", s)?;
            }
        }
        if let Some(e) = &self.excision {
            non_negative("excision.mass", e.mass)?;
            non_negative("excision.init_radius", e.init_radius)?;
            positive("excision.eta", e.eta)?;
        }
        if self.binary_diagnostics.is_some() && !self.uses_binary() {
            return Err(ConfigError::DiagnosticsWithoutBinary);
        }
        Ok(())
    }
}

/// Global physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub G: f64, // gravitational constant
    pub hubble_h0: f64, // Hubble constant in code units
    pub box_size: Option<[f64; 3]>, // box side lengths
    pub periodic: bool, // periodic boundaries
    pub self_gravity: bool, // tree self-gravity runs before the analytic terms
    pub centre: Centre, // centre of the static potentials
    pub time: f64, // start time
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            G: 1.0,
            hubble_h0: 0.1,
            box_size: None,
            periodic: false,
            self_gravity: false,
            centre: Centre::Origin,
            time: 0.0,
        }
    }
}

/// Initial state of a single particle
#[derive(Deserialize, Debug, Clone)]
pub struct ParticleConfig {
    pub id: u64, // stable id, 0 for excised
    #[serde(rename = "type")]
    pub ptype: ParticleType, // type tag
    pub x: Vec<f64>, // position
    #[serde(default)]
    pub v: Vec<f64>, // velocity, zero when omitted
    pub m: f64, // mass
    #[serde(default)]
    pub tidal: bool, // track the tidal tensor
    #[serde(default)]
    pub grain_size: Option<f64>,
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub gravity: GravityConfig, // analytic terms
    #[serde(default)]
    pub parameters: ParametersConfig, // constants and geometry
    #[serde(default)]
    pub particles: Vec<ParticleConfig>, // local particles
}

/// Read and validate a scenario file
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, GravityError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;
    cfg.gravity.validate()?;
    Ok(cfg)
}
