use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `armflow` - manipulation trajectory orchestrator for pick-and-place arms.
#[derive(Parser, Debug)]
#[command(name = "armflow")]
#[command(version)]
#[command(about = "Plan, condition and dispatch pick-and-place arm motions.", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.armflow/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the effective configuration summary
    Status,

    /// Validate the configuration and print it
    CheckConfig {
        /// Print the configuration as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Summarize a persisted trajectory CSV
    Inspect {
        /// Path to a trajectory.csv file
        path: PathBuf,

        /// Group name recorded on the loaded trajectory
        #[arg(long, default_value = "right_arm")]
        group: String,
    },

    /// Run one pick-and-place cycle against the built-in simulation
    Demo {
        /// Arm group to drive (defaults to the configured right arm)
        #[arg(long)]
        arm: Option<String>,

        /// Object name to grasp
        #[arg(long, default_value = "object_1")]
        object: String,

        /// Approach distance to the object in meters
        #[arg(long, default_value = "0.1")]
        distance: f64,
    },

    /// Record the simulated robot for a fixed time, then play it back
    Replay {
        /// Recording file to write and read back (default: a timestamped
        /// file under <package_root>/recordings)
        #[arg(long)]
        path: Option<PathBuf>,

        /// How long to record, in milliseconds
        #[arg(long, default_value = "1000")]
        duration_ms: u64,

        /// Dispatch each recorded configuration separately
        #[arg(long)]
        interactive: bool,
    },
}
