// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use pose_trail::cli::args::{Cli, Commands};
use pose_trail::cli::track::run_tracking;

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Track(args) => run_tracking(args),
    }
}
