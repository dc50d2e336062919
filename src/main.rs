use std::{
    env, fs,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use stabilizer::{
    link::{CsvReplay, LogSink, SimulatedLink, SimulationConfig, TelemetrySource, pump},
    parameters::parse_string,
    session::{LogObserver, SessionController, StabilizerConfig},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Parameter file
    #[arg(short, long, default_value = "config/params.toml")]
    params: PathBuf,

    /// Replay a recorded `t,source,a,b,c` log instead of simulating a link
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Pace the simulated link on the wall clock
    #[arg(long)]
    realtime: bool,

    /// Forward corrective setpoints to the link
    #[arg(short, long)]
    forward: bool,
}

fn main() -> Result<()> {
    // Default log level to "info"
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") }
    }

    pretty_env_logger::init();

    let args = Args::parse();

    let params_toml = fs::read_to_string(&args.params)
        .with_context(|| format!("Could not read {}", args.params.display()))?;
    let params = parse_string(&params_toml)?;

    let mut config = StabilizerConfig::from_parameters(&params)?;
    config.setpoint.forward |= args.forward;

    let mut source: Box<dyn TelemetrySource> = match &args.replay {
        Some(path) => Box::new(CsvReplay::from_path(path)?),
        None => {
            let mut sim = SimulationConfig::from_parameters(&params)?;
            sim.realtime = args.realtime;
            Box::new(SimulatedLink::new(sim)?)
        }
    };

    info!(
        "Estimating drift over {} records (forwarding {})",
        config.window,
        if config.setpoint.forward { "on" } else { "off" }
    );

    let handle = SessionController::new(
        config,
        Box::new(LogObserver),
        Some(Box::new(LogSink::default())),
    )
    .spawn()?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    let publisher = handle.publisher();
    let pumped = pump(source.as_mut(), &publisher, &stop);
    drop(publisher);

    // Join before reporting a source error so the session is closed either way
    let summaries = handle.join()?;
    let published = pumped?;

    info!(
        "Done: {published} link events, {} session(s)",
        summaries.len()
    );

    Ok(())
}
