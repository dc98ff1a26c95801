//! Anchor bodies: location on the local process and global synchronization
//!
//! Anchors are sink particles whose state the analytic potentials depend
//! on. Each process scans its own particles, then one collective turns the
//! local observations into an [`AnchorTable`] that is identical on every
//! rank:
//! - single anchor: element-wise sum, since at most one rank holds it
//! - binary: all-gather of a fixed two-record block per rank, keeping the
//!   records with positive mass, ordered by particle id
//!
//! [`AnchorTable::synchronize`] is the only way to obtain a
//! [`SyncedAnchors`] token, and force evaluation needs that token, so no
//! potential can read anchor state before the collective has completed.

use log::{debug, warn};

use crate::error::{ConfigError, GravityError, SyncError};
use super::comm::Collective;
use super::states::{NVec3, System};

/// Largest particle id an anchor may carry: ids travel through the
/// collectives as f64, which is exact up to 2^53
pub const MAX_ANCHOR_ID: u64 = 1 << 53;

/// Position, mass and id of one anchor; mass 0 marks an absent record
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorRecord {
    pub position: NVec3,
    pub mass: f64,
    pub id: u64,
}

impl AnchorRecord {
    /// Number of f64 values in the wire block of one record
    pub const BLOCK: usize = 5;

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.mass > 0.0 && self.position.iter().all(|x| x.is_finite())
    }

    fn write_block(&self, out: &mut [f64]) {
        out[0] = self.position.x;
        out[1] = self.position.y;
        out[2] = self.position.z;
        out[3] = self.mass;
        // exact for ids up to MAX_ANCHOR_ID, checked by the census
        out[4] = self.id as f64;
    }

    fn read_block(block: &[f64]) -> Self {
        Self {
            position: NVec3::new(block[0], block[1], block[2]),
            mass: block[3],
            id: block[4] as u64,
        }
    }
}

/// First local sink particle, or an absent record
pub fn locate_anchor(sys: &System) -> AnchorRecord {
    sys.particles
        .iter()
        .find(|p| p.ptype.is_anchor())
        .map(|p| AnchorRecord {
            position: p.position,
            mass: p.mass,
            id: p.id,
        })
        .unwrap_or_default()
}

/// First two local sink particles, absent records filling the rest
pub fn locate_binary_candidates(sys: &System) -> [AnchorRecord; 2] {
    let mut out = [AnchorRecord::absent(); 2];
    for (slot, p) in out
        .iter_mut()
        .zip(sys.particles.iter().filter(|p| p.ptype.is_anchor()))
    {
        *slot = AnchorRecord {
            position: p.position,
            mass: p.mass,
            id: p.id,
        };
    }
    out
}

/// Which synchronizers a configuration needs, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnchorNeeds {
    pub single: bool,
    pub binary: bool,
}

impl AnchorNeeds {
    /// Number of sink particles that must exist globally
    pub fn expected_sinks(&self) -> Option<usize> {
        if self.binary {
            Some(2)
        } else if self.single {
            Some(1)
        } else {
            None
        }
    }
}

/// Globally consistent anchor state, rebuilt every step
#[derive(Debug, Clone, Default)]
pub struct AnchorTable {
    pub single: AnchorRecord,
    pub binary: [AnchorRecord; 2],
}

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the synchronizers selected by `needs`, single before binary.
    ///
    /// Collective: every rank must call this with the same `needs`.
    pub fn synchronize<C: Collective>(
        &mut self,
        comm: &C,
        sys: &mut System,
        needs: AnchorNeeds,
    ) -> Result<SyncedAnchors<'_>, GravityError> {
        if needs.single {
            self.synchronize_single(comm, sys)?;
        }
        if needs.binary {
            self.synchronize_binary(comm, sys)?;
        }
        Ok(SyncedAnchors { table: self })
    }

    /// Sum variant. The local candidate is summed with a holder count so
    /// two ranks claiming the anchor are reported rather than averaged in.
    /// Writes the cached `anchor_offset` of every local particle.
    pub fn synchronize_single<C: Collective>(
        &mut self,
        comm: &C,
        sys: &mut System,
    ) -> Result<(), GravityError> {
        let local = locate_anchor(sys);
        let mut block = [0.0; AnchorRecord::BLOCK + 1];
        if local.is_valid() {
            local.write_block(&mut block);
            block[AnchorRecord::BLOCK] = 1.0;
        }

        let total = comm.all_reduce_sum(&block)?;
        let holders = total[AnchorRecord::BLOCK] as usize;
        if holders > 1 {
            return Err(SyncError::DuplicateAnchor(holders).into());
        }

        self.single = AnchorRecord::read_block(&total);
        if !self.single.is_valid() {
            if comm.rank() == 0 {
                warn!("single anchor absent this step; anchored terms are skipped");
            }
            self.single = AnchorRecord::absent();
            for p in sys.particles.iter_mut() {
                p.anchor_offset = None;
            }
            return Ok(());
        }

        let anchor = self.single.position;
        for p in sys.particles.iter_mut() {
            p.anchor_offset = Some(anchor - p.position);
        }
        debug!("single anchor id {} at {:?}", self.single.id, anchor);
        Ok(())
    }

    /// Gather variant: two records per rank, positive-mass records kept
    /// and sorted by id so slot roles stay stable as anchors migrate
    /// between ranks.
    pub fn synchronize_binary<C: Collective>(
        &mut self,
        comm: &C,
        sys: &System,
    ) -> Result<(), GravityError> {
        let local = locate_binary_candidates(sys);
        let mut block = [0.0; 2 * AnchorRecord::BLOCK];
        for (rec, chunk) in local.iter().zip(block.chunks_mut(AnchorRecord::BLOCK)) {
            rec.write_block(chunk);
        }

        let all = comm.all_gather(&block)?;
        let mut found: Vec<AnchorRecord> = all
            .chunks(AnchorRecord::BLOCK)
            .map(AnchorRecord::read_block)
            .filter(|r| r.mass > 0.0)
            .collect();
        if found.len() > 2 {
            return Err(SyncError::TooManyAnchors(found.len()).into());
        }
        found.sort_by_key(|r| r.id);

        self.binary = [AnchorRecord::absent(); 2];
        for (slot, rec) in self.binary.iter_mut().zip(found) {
            *slot = rec;
        }
        if comm.rank() == 0 && !self.binary.iter().all(AnchorRecord::is_valid) {
            warn!("binary anchor table incomplete this step; missing slots are skipped");
        }
        Ok(())
    }
}

/// Proof that the anchor table was synchronized this step
#[derive(Debug, Clone, Copy)]
pub struct SyncedAnchors<'a> {
    table: &'a AnchorTable,
}

impl<'a> SyncedAnchors<'a> {
    pub fn table(&self) -> &'a AnchorTable {
        self.table
    }

    /// Valid single anchor, if any
    pub fn single(&self) -> Option<&'a AnchorRecord> {
        Some(&self.table.single).filter(|r| r.is_valid())
    }

    /// Binary slots; invalid slots must be skipped by callers
    pub fn binary(&self) -> &'a [AnchorRecord; 2] {
        &self.table.binary
    }

    /// Both binary anchors, when both are valid
    pub fn binary_pair(&self) -> Option<(&'a AnchorRecord, &'a AnchorRecord)> {
        let [a, b] = &self.table.binary;
        (a.is_valid() && b.is_valid()).then_some((a, b))
    }
}

/// Check at startup that the run holds as many sink particles as the
/// configured models need, each with an id the collectives carry
/// exactly. Collective.
pub fn validate_anchor_census<C: Collective>(
    comm: &C,
    sys: &System,
    needs: AnchorNeeds,
) -> Result<(), GravityError> {
    let Some(expected) = needs.expected_sinks() else {
        return Ok(());
    };
    let sinks = sys.particles.iter().filter(|p| p.ptype.is_anchor());
    let local = sinks.clone().count();
    let oversized = sinks.filter(|p| p.id > MAX_ANCHOR_ID).count();
    let total = comm.all_reduce_sum(&[local as f64, oversized as f64])?;

    let found = total[0] as usize;
    if found != expected {
        return Err(ConfigError::AnchorCensus { expected, found }.into());
    }
    let oversized = total[1] as usize;
    if oversized > 0 {
        return Err(ConfigError::AnchorIdOutOfRange(oversized).into());
    }
    Ok(())
}
