//! Analytic acceleration contributors
//!
//! Defines the [`AnalyticPotential`] trait every catalog entry implements,
//! the per-step [`ForceContext`] they read, and [`AccelSet`], the resolved
//! list of active entries for a run.

use crate::error::ConfigError;
use super::anchors::SyncedAnchors;
use super::params::{Centre, Parameters};
use super::states::{NMat3, NVec3, Particle, System};

/// How an entry combines with what is already in `grav_accel`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    /// Adds to the accumulator
    Additive,
    /// Replaces (some components of) the accumulator; runs before every
    /// additive entry and at most one per run
    Overwrite,
}

/// Read-only state for one force pass. Only constructible from a
/// [`SyncedAnchors`] token, so anchors are synchronized before any entry runs.
pub struct ForceContext<'a> {
    pub params: &'a Parameters,
    pub anchors: SyncedAnchors<'a>,
    pub t: f64, // simulation time of this pass
}

impl<'a> ForceContext<'a> {
    pub fn new(params: &'a Parameters, anchors: SyncedAnchors<'a>, t: f64) -> Self {
        Self { params, anchors, t }
    }

    /// Centre of the static potentials, `None` when anchored to an absent anchor
    pub fn centre(&self) -> Option<NVec3> {
        match self.params.centre {
            Centre::Origin => Some(NVec3::zeros()),
            Centre::Box => Some(self.params.box_half),
            Centre::Anchor => self.anchors.single().map(|a| a.position),
        }
    }

    /// Position of `p` relative to the potential centre
    pub fn displacement(&self, p: &Particle) -> Option<NVec3> {
        self.centre().map(|c| p.position - c)
    }
}

/// A closed-form external potential.
///
/// Entries filter particle types themselves and must be safe to call on
/// any particle.
pub trait AnalyticPotential: Send + Sync {
    fn name(&self) -> &'static str;

    fn composition(&self) -> Composition {
        Composition::Additive
    }

    /// Contribution to a single particle
    fn accelerate(&self, ctx: &ForceContext, p: &mut Particle);

    /// Contribution to every active particle of `sys`
    fn apply(&self, ctx: &ForceContext, sys: &mut System) {
        let System { particles, active, .. } = sys;
        for &i in active.iter() {
            self.accelerate(ctx, &mut particles[i]);
        }
    }
}

/// Proof that every configured entry has run for this step
#[derive(Debug)]
pub struct ForcesApplied {
    _private: (),
}

/// Resolved list of active entries; overwriting entries first
#[derive(Default)]
pub struct AccelSet {
    terms: Vec<Box<dyn AnalyticPotential>>,
}

impl AccelSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add an entry. A second overwriting entry is rejected.
    pub fn with<T>(mut self, term: T) -> Result<Self, ConfigError>
    where
        T: AnalyticPotential + 'static,
    {
        if term.composition() == Composition::Overwrite {
            if let Some(existing) = self.terms.first().filter(|t| t.composition() == Composition::Overwrite) {
                return Err(ConfigError::ConflictingOverwrite(existing.name(), term.name()));
            }
            self.terms.insert(0, Box::new(term));
        } else {
            self.terms.push(Box::new(term));
        }
        Ok(self)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.terms.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Run every entry over the active set of `sys`
    pub fn apply(&self, ctx: &ForceContext, sys: &mut System) -> ForcesApplied {
        for term in &self.terms {
            term.apply(ctx, sys);
        }
        ForcesApplied { _private: () }
    }
}

/// Reset acceleration (and tidal tensor, where tracked) of every active
/// particle. Only valid when no tree solver has written a base value.
pub fn zero_accelerations(sys: &mut System) {
    let System { particles, active, .. } = sys;
    for &i in active.iter() {
        let p = &mut particles[i];
        p.grav_accel = NVec3::zeros();
        if let Some(t) = p.tidal_tensor.as_mut() {
            *t = NMat3::zeros();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::anchors::{AnchorNeeds, AnchorTable};
    use crate::simulation::comm::SerialComm;
    use crate::simulation::states::ParticleType;

    struct Push(f64);
    impl AnalyticPotential for Push {
        fn name(&self) -> &'static str {
            "push"
        }
        fn accelerate(&self, _ctx: &ForceContext, p: &mut Particle) {
            p.grav_accel.x += self.0;
        }
    }

    struct Set(f64, &'static str);
    impl AnalyticPotential for Set {
        fn name(&self) -> &'static str {
            self.1
        }
        fn composition(&self) -> Composition {
            Composition::Overwrite
        }
        fn accelerate(&self, _ctx: &ForceContext, p: &mut Particle) {
            p.grav_accel.x = self.0;
        }
    }

    fn one_gas() -> System {
        let mut p = Particle::new(1, ParticleType::Gas, NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0);
        p.grav_accel = NVec3::new(10.0, 0.0, 0.0);
        System::new(vec![p], 0.0)
    }

    #[test]
    fn overwrite_runs_before_additive_terms() {
        let set = AccelSet::new().with(Push(1.0)).unwrap().with(Set(5.0, "set")).unwrap();
        assert_eq!(set.names(), vec!["set", "push"]);

        let mut sys = one_gas();
        let params = Parameters::default();
        let mut table = AnchorTable::new();
        let synced = table.synchronize(&SerialComm, &mut sys, AnchorNeeds::default()).unwrap();
        let ctx = ForceContext::new(&params, synced, 0.0);
        set.apply(&ctx, &mut sys);
        assert_eq!(sys.particles[0].grav_accel.x, 6.0);
    }

    #[test]
    fn second_overwrite_is_rejected() {
        let err = AccelSet::new()
            .with(Set(1.0, "a"))
            .unwrap()
            .with(Set(2.0, "b"))
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::ConflictingOverwrite("a", "b"));
    }

    #[test]
    fn zeroing_only_touches_active_particles() {
        let mut sys = one_gas();
        sys.particles.push(sys.particles[0].clone().with_tidal_tensor());
        sys.particles[1].tidal_tensor = Some(NMat3::identity());
        sys.active = vec![1];
        zero_accelerations(&mut sys);
        assert_eq!(sys.particles[0].grav_accel.x, 10.0);
        assert_eq!(sys.particles[1].grav_accel, NVec3::zeros());
        assert_eq!(sys.particles[1].tidal_tensor, Some(NMat3::zeros()));
    }
}
