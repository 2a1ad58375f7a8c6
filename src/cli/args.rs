// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::{Args, Parser, Subcommand};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Track Options:
    --source, -s <SOURCE>         Video file, frame directory or glob (e.g. frames/*.png)
    --detections, -d <FILE>       JSON detection log produced by the pose tracker
    --target, -t <ID>             Follow one identity; omit to record every identity
    --output-dir, -o <DIR>        Where traces and the output video land [default: results]
    --show                        Display annotated frames in a window
    --save-video <BOOL>           Write the annotated video [default: true]
    --fps <FPS>                   Frame rate for image sequences [default: 30]
    --conf <CONF>                 Minimum detection confidence [default: 0.5]
    --anchor                      Mark and log the first detection's box anchor
    --verbose <BOOL>              Log every processed frame [default: true]

Examples:
    pose-trail track --source test_video.mp4 --detections tracks.json --target 1
    pose-trail track -s frames/ -d tracks.json -o runs/multi --save-video false
    pose-trail track -s test_video.mp4 -d tracks.json -t 3 --show
    pose-trail track -s test_video.mp4 -d tracks.json --anchor"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Overlay tracked skeletons on a video and write keypoint traces
    Track(TrackArgs),
}

/// Arguments for the track command.
#[derive(Args, Debug)]
pub struct TrackArgs {
    /// Video file, frame directory or glob pattern
    #[arg(short, long)]
    pub source: String,

    /// JSON detection log
    #[arg(short, long)]
    pub detections: String,

    /// Identity to follow (single-subject mode)
    #[arg(short, long)]
    pub target: Option<i64>,

    /// Output directory for traces and video
    #[arg(short, long, default_value = "results")]
    pub output_dir: String,

    /// Display annotated frames in a window
    #[arg(long, default_value_t = false)]
    pub show: bool,

    /// Write the annotated video
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub save_video: bool,

    /// Frame rate used for image sequences
    #[arg(long, default_value_t = 30.0)]
    pub fps: f32,

    /// Minimum detection confidence
    #[arg(long, default_value_t = 0.5)]
    pub conf: f32,

    /// Mark and log the box anchor of the first detection
    #[arg(long, default_value_t = false)]
    pub anchor: bool,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_track_args_defaults() {
        let args = Cli::parse_from([
            "app",
            "track",
            "--source",
            "video.mp4",
            "--detections",
            "tracks.json",
        ]);
        match args.command {
            Commands::Track(track_args) => {
                assert_eq!(track_args.source, "video.mp4");
                assert_eq!(track_args.detections, "tracks.json");
                assert!(track_args.target.is_none());
                assert_eq!(track_args.output_dir, "results");
                assert!(!track_args.show);
                assert!(track_args.save_video);
                assert!((track_args.conf - 0.5).abs() < f32::EPSILON);
                assert!(track_args.verbose);
                assert!(!track_args.anchor);
            }
        }
    }

    #[test]
    fn test_track_args_custom() {
        let args = Cli::parse_from([
            "app",
            "track",
            "-s",
            "frames/",
            "-d",
            "tracks.json",
            "-t",
            "7",
            "-o",
            "out",
            "--save-video",
            "false",
            "--fps",
            "24",
            "--verbose",
            "false",
            "--anchor",
        ]);
        match args.command {
            Commands::Track(track_args) => {
                assert_eq!(track_args.target, Some(7));
                assert_eq!(track_args.output_dir, "out");
                assert!(!track_args.save_video);
                assert!((track_args.fps - 24.0).abs() < f32::EPSILON);
                assert!(!track_args.verbose);
                assert!(track_args.anchor);
            }
        }
    }

    #[test]
    fn test_missing_detections_rejected() {
        assert!(Cli::try_parse_from(["app", "track", "--source", "video.mp4"]).is_err());
    }
}
