//! Catalog of closed-form external potentials
//!
//! - `point`: point masses and the Keplerian test-problem variants
//! - `spheres`: Plummer, Hernquist, singular isothermal and NFW profiles
//! - `disk`: time-interpolated Miyamoto–Nagai disk
//! - `frame`: shearing-sheet frame terms and uniform vertical test fields

pub mod disk;
pub mod frame;
pub mod point;
pub mod spheres;

pub use disk::{DiskParams, DiskTable, GrowingDisk};
pub use frame::{RayleighTaylor, RdiTestProblem, ShearingSheet};
pub use point::{KeplerianDisk, KeplerianTestProblem, PaczynskiWiita, PointMass};
pub use spheres::{Hernquist, IsothermalSphere, Nfw, Plummer};
