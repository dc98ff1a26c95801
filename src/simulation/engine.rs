//! Dispatcher for the analytic gravity pass
//!
//! [`AnalyticGravity`] is resolved once from a [`GravityConfig`] and then
//! driven once per force evaluation. Each step runs, identically on every
//! rank:
//!
//! 1. zero the accumulators of active particles (self-gravity off only)
//! 2. synchronize the anchors (single, then binary)
//! 3. excise gas inside the excision radius
//! 4. every configured catalog entry, overwriting entries first
//! 5. binary diagnostics reduction and log line

use std::io::Write;

use log::{debug, info};

use crate::configuration::config::{ExtendedConfig, GravityConfig, PointAnchorConfig};
use crate::error::{ConfigError, GravityError};
use super::anchors::{validate_anchor_census, AnchorNeeds, AnchorTable};
use super::binary::{BinaryDiagnostics, TorqueLog, TorqueSample};
use super::comm::Collective;
use super::excision::Excision;
use super::forces::{zero_accelerations, AccelSet, ForceContext};
use super::params::{Centre, Parameters};
use super::potentials::KeplerianDisk;
use super::states::System;

/// Outcome of one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub excised: usize, // particles excised on this rank
    pub torques: Option<TorqueSample>, // reduced diagnostics, when enabled
}

pub struct AnalyticGravity {
    forces: AccelSet,
    needs: AnchorNeeds,
    excision: Option<Excision>,
    diagnostics: Option<BinaryDiagnostics>,
    anchors: AnchorTable,
}

impl AnalyticGravity {
    /// Validate `cfg` and resolve it into the list of active entries
    pub fn from_config(cfg: &GravityConfig, params: &Parameters) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if params.centre == Centre::Anchor && cfg.uses_binary() {
            return Err(ConfigError::AnchoredCentreWithBinary);
        }

        let mut forces = AccelSet::new();
        if let Some(point) = &cfg.point_anchor {
            forces = match point.clone() {
                PointAnchorConfig::PointMass(m) => forces.with(m)?,
                PointAnchorConfig::Keplerian => forces.with(KeplerianDisk)?,
                PointAnchorConfig::KeplerianTestProblem(k) => forces.with(k)?,
                PointAnchorConfig::PaczynskiWiita(pw) => forces.with(pw)?,
                PointAnchorConfig::Binary(b) => forces.with(b)?,
            };
        }
        if let Some(ext) = &cfg.extended {
            forces = match ext.clone() {
                ExtendedConfig::Plummer(m) => forces.with(m)?,
                ExtendedConfig::Hernquist(m) => forces.with(m)?,
                ExtendedConfig::IsothermalSphere(m) => forces.with(m)?,
                ExtendedConfig::Nfw(m) => forces.with(m)?,
                ExtendedConfig::GrowingDisk(d) => forces.with(d)?,
            };
        }
        if let Some(rt) = &cfg.frame.rayleigh_taylor {
            forces = forces.with(rt.clone())?;
        }
        if let Some(sheet) = &cfg.frame.shearing_sheet {
            forces = forces.with(sheet.clone())?;
        }
        if let Some(rdi) = &cfg.frame.rdi {
            let mut rdi = rdi.clone();
            rdi.shearing_box = cfg.frame.shearing_sheet.is_some();
            rdi.stratified_box = cfg.frame.shearing_sheet.as_ref().is_some_and(|s| s.stratified);
            forces = forces.with(rdi)?;
        }

        let needs = AnchorNeeds {
            single: params.centre == Centre::Anchor,
            binary: cfg.uses_binary(),
        };
        info!(
            "analytic gravity: terms {:?}, anchors {:?}, self-gravity {}",
            forces.names(),
            needs,
            if params.self_gravity { "on" } else { "off" }
        );

        Ok(Self {
            forces,
            needs,
            excision: cfg.excision.clone(),
            diagnostics: cfg.binary_diagnostics.clone(),
            anchors: AnchorTable::new(),
        })
    }

    pub fn needs(&self) -> AnchorNeeds {
        self.needs
    }

    pub fn term_names(&self) -> Vec<&'static str> {
        self.forces.names()
    }

    /// Anchor table as of the last step
    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    /// Startup check that the run holds the anchors the terms need. Collective.
    pub fn initialize<C: Collective>(&self, comm: &C, sys: &System) -> Result<(), GravityError> {
        validate_anchor_census(comm, sys, self.needs)
    }

    /// One analytic gravity pass at time `sys.t`. Collective: every rank
    /// calls this once per force evaluation.
    pub fn step<C: Collective, W: Write>(
        &mut self,
        comm: &C,
        params: &Parameters,
        sys: &mut System,
        log: Option<&mut TorqueLog<W>>,
    ) -> Result<StepReport, GravityError> {
        if !params.self_gravity {
            zero_accelerations(sys);
        }

        let t = sys.t;
        let synced = self.anchors.synchronize(comm, sys, self.needs)?;
        let ctx = ForceContext::new(params, synced, t);

        let excised = match &self.excision {
            Some(ex) => ex.apply(&ctx, sys),
            None => 0,
        };

        let applied = self.forces.apply(&ctx, sys);

        let torques = match &self.diagnostics {
            Some(diag) => diag.run(comm, synced, params, sys, applied, log)?,
            None => None,
        };
        debug!("analytic gravity step at t = {t}: {excised} excised");

        Ok(StepReport { excised, torques })
    }
}
