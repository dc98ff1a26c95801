pub mod states;
pub mod params;
pub mod comm;
pub mod anchors;
pub mod forces;
pub mod potentials;
pub mod binary;
pub mod excision;
pub mod engine;
pub mod scenario;
