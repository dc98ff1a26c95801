pub mod error;
pub mod simulation;
pub mod configuration;

pub use error::{ConfigError, CommError, GravityError, SyncError};

pub use simulation::states::{Particle, ParticleType, System, NVec3, NMat3};
pub use simulation::params::{Centre, Parameters};
pub use simulation::comm::{Collective, LocalGroup, SerialComm, ThreadComm};
#[cfg(feature = "mpi")]
pub use simulation::comm::MpiComm;
pub use simulation::anchors::{AnchorNeeds, AnchorRecord, AnchorTable, SyncedAnchors};
pub use simulation::forces::{AccelSet, AnalyticPotential, Composition, ForceContext, ForcesApplied, zero_accelerations};
pub use simulation::binary::{BinaryDiagnostics, BinaryOrbit, TorqueLog, TorqueSample};
pub use simulation::excision::Excision;
pub use simulation::engine::{AnalyticGravity, StepReport};
pub use simulation::scenario::Scenario;

pub use configuration::config::{ScenarioConfig, GravityConfig, ParametersConfig, ParticleConfig, load_scenario};
