//! Physical and run parameters seen by every analytic gravity term
//!
//! `Parameters` holds the run-wide settings:
//! - gravitational constant `G` and Hubble constant in code units,
//! - box half-extents and periodicity,
//! - whether tree self-gravity is running,
//! - the point the static potentials are centred on

use serde::Deserialize;

use super::states::NVec3;

/// Where static potentials are centred
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Centre {
    /// Coordinate origin
    #[default]
    Origin,
    /// Centre of the (periodic) box, i.e. the box half-extents
    Box,
    /// Synchronized single anchor (sink particle)
    Anchor,
}

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Parameters {
    pub G: f64, // gravitational constant
    pub hubble_h0: f64, // Hubble constant in code units (NFW virial radius)
    pub box_half: NVec3, // box half-extents
    pub periodic: bool, // periodic boundaries
    pub self_gravity: bool, // tree self-gravity already wrote grav_accel
    pub centre: Centre, // centre of the static potentials
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            G: 1.0,
            hubble_h0: 0.1,
            box_half: NVec3::zeros(),
            periodic: false,
            self_gravity: false,
            centre: Centre::Origin,
        }
    }
}
