//! Error types for anagrav.

use thiserror::Error;

/// Invalid gravity configuration, detected once at startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("disk table columns differ in length: t={t}, mass={mass}, radius={radius}, height={height}")]
    DiskTableLength {
        t: usize,
        mass: usize,
        radius: usize,
        height: usize,
    },

    #[error("disk table is empty")]
    EmptyDiskTable,

    #[error("disk table times must increase strictly (entry {0})")]
    DiskTableOrder(usize),

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("more than one overwriting model configured: {0} and {1}")]
    ConflictingOverwrite(&'static str, &'static str),

    #[error("anchor census: expected {expected} sink particles globally, found {found}")]
    AnchorCensus { expected: usize, found: usize },

    #[error("axis index {0} out of range")]
    InvalidAxis(usize),

    #[error("binary diagnostics configured without the binary model")]
    DiagnosticsWithoutBinary,

    #[error("centre: anchor needs exactly one sink, but the binary model uses two")]
    AnchoredCentreWithBinary,

    #[error("{0} sink particles have ids above 2^53, which collectives cannot carry exactly")]
    AnchorIdOutOfRange(usize),
}

/// Inconsistent anchor state found during synchronization.
#[derive(Debug, Error, PartialEq)]
pub enum SyncError {
    #[error("{0} processes each claim to hold the single anchor")]
    DuplicateAnchor(usize),

    #[error("{0} binary anchor candidates found, expected at most 2")]
    TooManyAnchors(usize),
}

/// Failure inside a collective operation.
#[derive(Debug, Error, PartialEq)]
pub enum CommError {
    #[error("rank {rank} contributed {got} values to a collective expecting {expected}")]
    LengthMismatch {
        rank: usize,
        expected: usize,
        got: usize,
    },

    #[error("process group poisoned by a panicking rank")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum GravityError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("anchor synchronization error: {0}")]
    Sync(#[from] SyncError),

    #[error("collective communication error: {0}")]
    Comm(#[from] CommError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, GravityError>;
