//! Binary anchor forcing and circumbinary-disk diagnostics
//!
//! [`BinaryOrbit`] pulls every active particle toward each valid binary
//! anchor. [`BinaryDiagnostics`] runs once per step after all forces:
//! - gravitational torques of the disk on each anchor about the binary
//!   centre of mass, both total and from material outside the separation
//! - mass-weighted azimuth cosines (`psi`) and eccentricity-vector
//!   proxies (`edisc`), normalized by the gas disk mass
//! - optionally, the disk's net pull on each anchor fed back into the
//!   anchor particle's acceleration on the rank that holds it

use std::io::{self, Write};

use log::debug;
use serde::Deserialize;

use crate::error::GravityError;
use super::anchors::{AnchorRecord, SyncedAnchors};
use super::comm::Collective;
use super::forces::{AnalyticPotential, ForceContext, ForcesApplied};
use super::params::Parameters;
use super::states::{NVec3, Particle, ParticleType, System};

/// Point-mass pull of both binary anchors, a = -G m_j d_j / (|d_j|² + ε²)^(3/2)
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct BinaryOrbit {
    pub softening: f64,
}

/// Separation of `pos` from an anchor; in periodic boxes the offset is
/// re-centred on the box half-extents.
fn anchor_offset(params: &Parameters, pos: &NVec3, anchor: &AnchorRecord) -> NVec3 {
    let d = pos - anchor.position;
    if params.periodic {
        d - params.box_half
    } else {
        d
    }
}

impl AnalyticPotential for BinaryOrbit {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle) {
        let eps2 = self.softening * self.softening;
        for anchor in ctx.anchors.binary().iter().filter(|a| a.is_valid()) {
            let d = anchor_offset(ctx.params, &p.position, anchor);
            let r2 = d.norm_squared();
            if r2 == 0.0 {
                continue;
            }
            let s2 = r2 + eps2;
            p.grav_accel -= d * (ctx.params.G * anchor.mass / (s2 * s2.sqrt()));
        }
    }
}

/// What the per-step diagnostics compute
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BinaryDiagnostics {
    pub torques: bool, // torque / psi / edisc reduction and log line
    pub sink_feedback: bool, // add the disk's pull to the anchor particles
    pub planar: bool, // drop z of the disk pull (2-D runs)
}

impl Default for BinaryDiagnostics {
    fn default() -> Self {
        Self {
            torques: true,
            sink_feedback: false,
            planar: false,
        }
    }
}

/// Process-local partial sums, valid until reduced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinaryPartials {
    pub torque: [f64; 4], // [outer on 0, total on 0, outer on 1, total on 1]
    pub psi: [f64; 2],
    pub edisc: [f64; 2],
    pub disk_mass: f64,
    pub sink_accel: [NVec3; 2], // disk pull on each anchor
}

/// One reduced diagnostics record
#[derive(Debug, Clone, PartialEq)]
pub struct TorqueSample {
    pub time: f64,
    pub torque: [f64; 4],
    pub psi: [f64; 2], // normalized by disk mass
    pub edisc: [f64; 2], // normalized by disk mass
    pub disk_mass: f64,
}

impl BinaryDiagnostics {
    /// Accumulate the local partial sums over every non-anchor particle
    /// held by this process.
    #[allow(non_snake_case)]
    pub fn accumulate(
        &self,
        params: &Parameters,
        anchors: (&AnchorRecord, &AnchorRecord),
        sys: &System,
    ) -> BinaryPartials {
        let (a0, a1) = anchors;
        let G = params.G;
        let m_bin = a0.mass + a1.mass;
        let com = (a0.position * a0.mass + a1.position * a1.mass) / m_bin;
        let separation = (a0.position - a1.position).norm();
        let lever = [a0.position - com, a1.position - com];
        let masses = [a0.mass, a1.mass];

        let mut out = BinaryPartials::default();
        out.disk_mass = sys
            .particles
            .iter()
            .filter(|p| p.ptype == ParticleType::Gas)
            .map(|p| p.mass)
            .sum();

        for p in sys.particles.iter().filter(|p| !p.ptype.is_anchor()) {
            let rel = p.position - com;
            let r_com = rel.norm();
            let outer = r_com > separation;

            for (j, anchor) in [a0, a1].into_iter().enumerate() {
                let d = anchor_offset(params, &p.position, anchor);
                let r = d.norm();
                if r == 0.0 {
                    continue;
                }
                let pull = d * (G * p.mass / (r * r * r));
                out.sink_accel[j] += pull;

                let tq = masses[j] * (lever[j].x * pull.y - lever[j].y * pull.x);
                out.torque[2 * j + 1] += tq;
                if outer {
                    out.torque[2 * j] += tq;
                }
            }

            let phi = rel.y.atan2(rel.x);
            out.psi[0] += p.mass * phi.cos();
            out.psi[1] += p.mass * phi.sin();

            if r_com > 0.0 {
                let h = rel.cross(&p.velocity);
                let e = p.velocity.cross(&h) / (G * m_bin) - rel / r_com;
                out.edisc[0] += p.mass * e.x;
                out.edisc[1] += p.mass * e.y;
            }
        }

        if self.planar {
            for a in out.sink_accel.iter_mut() {
                a.z = 0.0;
            }
        }
        out
    }

    /// Reduce the diagnostics across all ranks, apply the anchor feedback
    /// and then write the log line on rank 0. Collective; needs the step's forces
    /// to be complete. Skipped on every rank alike when a binary slot is
    /// invalid.
    pub fn run<C: Collective, W: Write>(
        &self,
        comm: &C,
        anchors: SyncedAnchors<'_>,
        params: &Parameters,
        sys: &mut System,
        _applied: ForcesApplied,
        log: Option<&mut TorqueLog<W>>,
    ) -> Result<Option<TorqueSample>, GravityError> {
        let Some((a0, a1)) = anchors.binary_pair() else {
            return Ok(None);
        };
        let partials = self.accumulate(params, (a0, a1), sys);

        let mut sample = None;
        if self.torques {
            let mut local = [0.0; 9];
            local[..4].copy_from_slice(&partials.torque);
            local[4..6].copy_from_slice(&partials.edisc);
            local[6..8].copy_from_slice(&partials.psi);
            local[8] = partials.disk_mass;
            let total = comm.all_reduce_sum(&local)?;

            let disk_mass = total[8];
            let norm = |x: f64| if disk_mass > 0.0 { x / disk_mass } else { 0.0 };
            let s = TorqueSample {
                time: sys.t,
                torque: [total[0], total[1], total[2], total[3]],
                psi: [norm(total[6]), norm(total[7])],
                edisc: [norm(total[4]), norm(total[5])],
                disk_mass,
            };
            sample = Some(s);
        }

        if self.sink_feedback {
            let mut local = [0.0; 6];
            local[..3].copy_from_slice(partials.sink_accel[0].as_slice());
            local[3..].copy_from_slice(partials.sink_accel[1].as_slice());
            let total = comm.all_reduce_sum(&local)?;
            let pulls = [
                NVec3::new(total[0], total[1], total[2]),
                NVec3::new(total[3], total[4], total[5]),
            ];

            let System { particles, active, .. } = sys;
            for &i in active.iter() {
                let p = &mut particles[i];
                if !p.ptype.is_anchor() {
                    continue;
                }
                if p.id == a0.id {
                    p.grav_accel += pulls[0];
                } else if p.id == a1.id {
                    p.grav_accel += pulls[1];
                }
                debug!("disk feedback on anchor {}: {:?}", p.id, p.grav_accel);
            }
        }

        // rank-local I/O only once every rank is past the last collective
        if let (0, Some(log), Some(s)) = (comm.rank(), log, sample.as_ref()) {
            log.append(s)?;
        }
        Ok(sample)
    }
}

/// Append-only sink for diagnostics lines:
/// `time torque0..3 psi0 psi1 edisc0 edisc1`, whitespace separated.
pub struct TorqueLog<W: Write> {
    out: W,
}

impl<W: Write> TorqueLog<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn append(&mut self, s: &TorqueSample) -> io::Result<()> {
        writeln!(
            self.out,
            "{:.12} {:.12} {:.12} {:.12} {:.12} {:.12} {:.12} {:.12} {:.12}",
            s.time, s.torque[0], s.torque[1], s.torque[2], s.torque[3], s.psi[0], s.psi[1], s.edisc[0], s.edisc[1],
        )?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
