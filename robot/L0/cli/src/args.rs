//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use robot_diff::{Category, DEFAULT_FLOAT_TOLERANCE, DiffConfig};
use robot_report::{Palette, ReportFormat};

/// Generate a human-readable diff between two robot model files.
///
/// Supports URDF (.urdf), SDF (.sdf), MJCF (.xml) and USD (.usda) files.
#[derive(Debug, Parser)]
#[command(name = "robot-diff")]
#[command(version)]
pub struct Args {
    /// Path to the original robot model file
    #[arg(name = "OLD")]
    pub old: PathBuf,

    /// Path to the updated robot model file
    #[arg(name = "NEW")]
    pub new: PathBuf,

    /// Output format: status, git, category or json
    #[arg(long, default_value_t = ReportFormat::Status)]
    pub format: ReportFormat,

    /// Categories to exclude: kinematic, inertial, collision, visual
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub exclude: Vec<Category>,

    /// Relative tolerance for float comparison
    #[arg(long = "float-tol", default_value_t = DEFAULT_FLOAT_TOLERANCE)]
    pub float_tol: f64,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Diff configuration from the flags.
    pub fn diff_config(&self) -> DiffConfig {
        DiffConfig::default()
            .with_tolerance(self.float_tol)
            .exclude_all(self.exclude.iter().copied())
    }

    /// Palette from `--no-color`.
    pub fn palette(&self) -> Palette {
        Palette::new(!self.no_color)
    }
}
