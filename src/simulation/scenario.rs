//! Build a runnable analytic-gravity scenario from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle:
//! - numerical parameters (`Parameters`)
//! - local particle state (`System` with every particle active)
//! - the resolved analytic gravity dispatcher (`AnalyticGravity`)

use crate::configuration::config::{ParticleConfig, ScenarioConfig};
use crate::error::{ConfigError, GravityError};
use super::engine::AnalyticGravity;
use super::params::Parameters;
use super::states::{NVec3, Particle, System};

/// Fully-initialized scenario for one process
pub struct Scenario {
    pub parameters: Parameters,
    pub system: System,
    pub gravity: AnalyticGravity,
}

fn vec3(name: &'static str, v: &[f64]) -> Result<NVec3, ConfigError> {
    match v {
        [] => Ok(NVec3::zeros()),
        [x, y] => Ok(NVec3::new(*x, *y, 0.0)),
        [x, y, z] => Ok(NVec3::new(*x, *y, *z)),
        _ => Err(ConfigError::InvalidParameter { name, value: v.len() as f64 }),
    }
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, GravityError> {
        // Particles: map `ParticleConfig` -> runtime `Particle` using nalgebra vectors
        let particles = cfg
            .particles
            .iter()
            .map(|pc: &ParticleConfig| -> Result<Particle, ConfigError> {
                let mut p = Particle::new(pc.id, pc.ptype, vec3("x", &pc.x)?, vec3("v", &pc.v)?, pc.m);
                if pc.tidal {
                    p = p.with_tidal_tensor();
                }
                if let Some(size) = pc.grain_size.filter(|s| !(*s > 0.0 && s.is_finite())) {
                    return Err(ConfigError::InvalidParameter { name: "grain_size", value: size });
                }
                p.grain_size = pc.grain_size;
                Ok(p)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let p_cfg = &cfg.parameters;
        let box_half = match p_cfg.box_size {
            Some([x, y, z]) => NVec3::new(x, y, z) * 0.5,
            None => NVec3::zeros(),
        };
        let parameters = Parameters {
            G: p_cfg.G,
            hubble_h0: p_cfg.hubble_h0,
            box_half,
            periodic: p_cfg.periodic,
            self_gravity: p_cfg.self_gravity,
            centre: p_cfg.centre,
        };

        let system = System::new(particles, p_cfg.time);
        let gravity = AnalyticGravity::from_config(&cfg.gravity, &parameters)?;

        Ok(Self {
            parameters,
            system,
            gravity,
        })
    }
}
