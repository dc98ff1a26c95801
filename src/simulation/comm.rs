//! Collective communication between the processes of a run
//!
//! Every process owns a disjoint part of the particle set and runs the
//! same sequence of collectives. A rank that skips or reorders a call
//! stalls the whole group, so callers must issue collectives in the same
//! order on every rank.
//!
//! - [`SerialComm`]: a single process; collectives are identities
//! - [`LocalGroup`] / [`ThreadComm`]: `n` ranks living on threads of one
//!   process, used to exercise the multi-process paths
//! - `MpiComm` (feature `mpi`): the world communicator of an MPI job

use std::sync::{Arc, Barrier, Mutex};

use crate::error::CommError;

/// Sum-reduce and all-gather over a fixed process group
pub trait Collective {
    /// Rank of this process, `0..size()`
    fn rank(&self) -> usize;

    /// Number of processes in the group
    fn size(&self) -> usize;

    /// Element-wise sum of `local` over all ranks, visible on every rank
    fn all_reduce_sum(&self, local: &[f64]) -> Result<Vec<f64>, CommError>;

    /// Concatenation of every rank's `local`, in rank order, visible on
    /// every rank. All ranks must pass slices of the same length.
    fn all_gather(&self, local: &[f64]) -> Result<Vec<f64>, CommError>;
}

/// One-process group
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Collective for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_sum(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
        Ok(local.to_vec())
    }

    fn all_gather(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
        Ok(local.to_vec())
    }
}

struct Shared {
    barrier: Barrier,
    slots: Mutex<Vec<Vec<f64>>>,
}

/// Factory for an in-process group of `n` ranks
pub struct LocalGroup;

impl LocalGroup {
    /// Create `n` connected handles; hand one to each thread
    pub fn new(n: usize) -> Vec<ThreadComm> {
        let shared = Arc::new(Shared {
            barrier: Barrier::new(n),
            slots: Mutex::new(vec![Vec::new(); n]),
        });
        (0..n)
            .map(|rank| ThreadComm {
                rank,
                size: n,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

/// Rank handle of a [`LocalGroup`]
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl Collective for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_sum(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
        let n = local.len();
        let gathered = self.all_gather(local)?;
        let mut out = vec![0.0; n];
        for chunk in gathered.chunks(n.max(1)) {
            for (o, v) in out.iter_mut().zip(chunk) {
                *o += v;
            }
        }
        Ok(out)
    }

    // errors are returned only after both barriers
    fn all_gather(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
        let written = self
            .shared
            .slots
            .lock()
            .map(|mut slots| slots[self.rank] = local.to_vec())
            .map_err(|_| CommError::Poisoned);
        // every rank has written its slot
        self.shared.barrier.wait();

        let result = written.and_then(|()| {
            let slots = self.shared.slots.lock().map_err(|_| CommError::Poisoned)?;
            let mut out = Vec::with_capacity(local.len() * self.size);
            for (rank, s) in slots.iter().enumerate() {
                if s.len() != local.len() {
                    return Err(CommError::LengthMismatch {
                        rank,
                        expected: local.len(),
                        got: s.len(),
                    });
                }
                out.extend_from_slice(s);
            }
            Ok(out)
        });
        // every rank has read before anyone writes the next collective
        self.shared.barrier.wait();
        result
    }
}

#[cfg(feature = "mpi")]
pub use self::mpi_comm::MpiComm;

#[cfg(feature = "mpi")]
mod mpi_comm {
    use mpi::collective::SystemOperation;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    use super::Collective;
    use crate::error::CommError;

    /// `MPI_COMM_WORLD` of a running MPI job. Finalizes MPI on drop.
    pub struct MpiComm {
        world: SimpleCommunicator,
        _universe: Universe,
    }

    impl MpiComm {
        /// Initialize MPI; `None` if it already was
        pub fn initialize() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            Some(Self { world, _universe: universe })
        }
    }

    impl Collective for MpiComm {
        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn all_reduce_sum(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
            let mut out = vec![0.0; local.len()];
            self.world.all_reduce_into(local, &mut out[..], SystemOperation::sum());
            Ok(out)
        }

        fn all_gather(&self, local: &[f64]) -> Result<Vec<f64>, CommError> {
            // MPI_Allgather needs equal counts; agree on them first
            let mut lens = vec![0u64; self.size()];
            self.world.all_gather_into(&(local.len() as u64), &mut lens[..]);
            if let Some((rank, &got)) = lens.iter().enumerate().find(|&(_, &n)| n != local.len() as u64) {
                return Err(CommError::LengthMismatch {
                    rank,
                    expected: local.len(),
                    got: got as usize,
                });
            }

            let mut out = vec![0.0; local.len() * self.size()];
            self.world.all_gather_into(local, &mut out[..]);
            Ok(out)
        }
    }
}
