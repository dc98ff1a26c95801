use anagrav::{load_scenario, Collective, Scenario, TorqueLog};
#[cfg(feature = "mpi")]
use anagrav::MpiComm;
#[cfg(not(feature = "mpi"))]
use anagrav::SerialComm;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::OpenOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file (YAML)
    #[arg(short, long, default_value = "scenarios/binary_disk.yaml")]
    file_name: PathBuf,

    /// Number of force passes
    #[arg(short, long, default_value_t = 1)]
    steps: usize,

    /// Time between passes
    #[arg(long, default_value_t = 0.0)]
    dt: f64,

    /// Append binary diagnostics to this file (written by rank 0)
    #[arg(long)]
    torque_log: Option<PathBuf>,
}

fn run<C: Collective>(comm: &C, args: &Args) -> Result<()> {
    let cfg = load_scenario(&args.file_name)
        .with_context(|| format!("failed to load scenario {}", args.file_name.display()))?;
    let Scenario { parameters, system, mut gravity } = Scenario::build_scenario(cfg)?;

    // every rank reads the same file and keeps its share
    let mut system = system.partition(comm.rank(), comm.size());
    gravity.initialize(comm, &system)?;

    let mut log = match (&args.torque_log, comm.rank()) {
        (Some(path), 0) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(TorqueLog::new(file))
        }
        _ => None,
    };

    let t0 = system.t;
    for step in 0..args.steps {
        system.t = t0 + step as f64 * args.dt;
        let report = gravity.step(comm, &parameters, &mut system, log.as_mut())?;
        info!("rank {} step {step} at t = {}: {} excised", comm.rank(), system.t, report.excised);
        if let (0, Some(s)) = (comm.rank(), &report.torques) {
            info!("torques {:?}, disk mass {}", s.torque, s.disk_mass);
        }
    }

    for p in &system.particles {
        println!(
            "{} {:?} {:.12e} {:.12e} {:.12e} {:.6e}",
            p.id, p.ptype, p.grav_accel.x, p.grav_accel.y, p.grav_accel.z, p.mass
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    #[cfg(feature = "mpi")]
    let comm = MpiComm::initialize().context("MPI was already initialized")?;
    #[cfg(not(feature = "mpi"))]
    let comm = SerialComm;

    run(&comm, &args)
}
