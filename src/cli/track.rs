// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::cli::args::TrackArgs;
use crate::continuity::TrackingMode;
use crate::detector::{ReplayDetector, TrackParams};
use crate::pipeline::{Pipeline, RunSummary};
use crate::{NAME, Result, Source, TrackerConfig, VERSION};
use crate::{error, info, section, success, verbose};

/// Build the run configuration from CLI arguments.
#[must_use]
pub fn config_from_args(args: &TrackArgs) -> TrackerConfig {
    let params = TrackParams {
        conf: args.conf,
        ..TrackParams::default()
    };
    let config = TrackerConfig::new()
        .with_output_dir(&args.output_dir)
        .with_show_preview(args.show)
        .with_save_video(args.save_video)
        .with_fps(args.fps)
        .with_params(params)
        .with_verbose(args.verbose)
        .with_anchor(args.anchor);

    match args.target {
        Some(target) => config.with_target(target),
        None => config.with_mode(TrackingMode::Multi),
    }
}

fn track(args: &TrackArgs) -> Result<RunSummary> {
    let config = config_from_args(args);
    let detector = ReplayDetector::from_path(&args.detections, config.params.clone())?;
    verbose!(
        "Loaded detections for {} frames from {}",
        detector.num_frames(),
        args.detections
    );

    let source = Source::from(args.source.as_str());
    let mut pipeline = Pipeline::new(config, detector)?;
    pipeline.run(source)
}

/// Run the track command, exiting with status 1 on a fatal error.
pub fn run_tracking(args: &TrackArgs) {
    crate::cli::logging::set_verbose(args.verbose);
    info!("{NAME} {VERSION} 🚀");

    let mode = match args.target {
        Some(id) => format!("single subject (identity {id})"),
        None => "all subjects".to_string(),
    };
    verbose!("Mode: {mode}");

    let summary = match track(args) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    section!("Summary");
    verbose!(
        "{} frames, {} observed, {} recovered, {} skipped, {} identities",
        summary.frames,
        summary.observed,
        summary.recovered,
        summary.skipped,
        summary.identities.len()
    );
    if args.anchor {
        verbose!("{} anchors logged", summary.anchors);
    }
    if summary.stopped_early {
        verbose!("Stopped before the end of the source");
    }
    success!("Results saved to {}", args.output_dir);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Identity;
    use clap::Parser;

    fn parse(extra: &[&str]) -> TrackArgs {
        let mut argv = vec!["app", "track", "-s", "v.mp4", "-d", "t.json"];
        argv.extend_from_slice(extra);
        match crate::cli::args::Cli::parse_from(argv).command {
            crate::cli::args::Commands::Track(args) => args,
        }
    }

    #[test]
    fn test_target_selects_single_mode() {
        let config = config_from_args(&parse(&["--target", "4"]));
        assert_eq!(
            config.mode,
            TrackingMode::Single {
                target: Identity(4)
            }
        );
    }

    #[test]
    fn test_no_target_selects_multi_mode() {
        let config = config_from_args(&parse(&["--conf", "0.3", "--show", "--anchor"]));
        assert_eq!(config.mode, TrackingMode::Multi);
        assert!(config.anchor);
        assert!(config.show_preview);
        assert!((config.params.conf - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_detection_log_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.json");
        let args = parse(&["-d", missing.to_str().unwrap()]);
        assert!(track(&args).is_err());
    }
}
