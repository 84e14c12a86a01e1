use argh::FromArgs;
use fiducial_nav::{run_frames, MarkerId, NavigationPlanner};
use std::{
    fs::File,
    io::BufWriter,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

mod config;
mod replay;
mod sink;

use replay::{ReplayDetector, ReplaySource};
use sink::ReportSink;

#[derive(FromArgs)]
/// Steer towards a fiducial marker using recorded detector output
struct Args {
    /// path to the bincode calibration file
    #[argh(option, short = 'c')]
    calibration: PathBuf,

    /// path to the JSON-lines replay of detector output
    #[argh(option, short = 'r')]
    replay: PathBuf,

    /// optional JSON planner configuration
    #[argh(option)]
    config: Option<PathBuf>,

    /// marker id to follow, repeat for several; overrides the config file
    #[argh(option, short = 'i')]
    id: Vec<MarkerId>,

    /// marker edge length in meters; overrides the config file
    #[argh(option, short = 's')]
    marker_size: Option<f64>,

    /// stop after this many frames
    #[argh(option, short = 'n')]
    max_frames: Option<usize>,

    /// write per-frame reports as JSON lines to this path
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    // intrinsics are loaded once, before the frame loop
    let intrinsics = fiducial_calib::load_intrinsics(&args.calibration)?;

    let config = config::load_config(args.config.as_deref())?;
    let config = config::apply_overrides(config, &args.id, args.marker_size);
    log::info!("following marker ids {:?}", config.allowed_ids);
    let planner = NavigationPlanner::new(config, intrinsics)?;

    let mut source = ReplaySource::open(&args.replay)?;
    let mut detector = ReplayDetector;
    let mut sink = match &args.output {
        Some(path) => ReportSink::with_writer(BufWriter::new(File::create(path)?)),
        None => ReportSink::log_only(),
    };

    // create a cancel token to stop the frame loop
    let cancel_token = Arc::new(AtomicBool::new(false));

    ctrlc::set_handler({
        let cancel_token = cancel_token.clone();
        move || {
            log::info!("received Ctrl-C, stopping after the current frame");
            cancel_token.store(true, Ordering::SeqCst);
        }
    })?;

    let summary = run_frames(
        &mut source,
        &mut detector,
        &planner,
        &mut sink,
        &cancel_token,
        args.max_frames,
    )?;

    log::info!(
        "processed {} frames: {} decisions, {} idle, {} skipped",
        summary.frames,
        summary.decisions,
        summary.idle,
        summary.skipped
    );

    Ok(())
}
