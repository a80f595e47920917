//! Normalize both files, diff them and render the report.

use std::path::Path;

use anyhow::{Context, Result};
use robot_diff::compare;
use robot_mjcf::MjcfNormalizer;
use robot_sdf::SdfNormalizer;
use robot_types::{NormalizeError, Normalizer, Robot, SourceFormat};
use robot_urdf::UrdfNormalizer;
use robot_usd::UsdNormalizer;

use crate::args::Args;

/// Normalizer for a source format.
fn normalizer_for(format: SourceFormat) -> Box<dyn Normalizer> {
    match format {
        SourceFormat::Urdf => Box::new(UrdfNormalizer),
        SourceFormat::Sdf => Box::new(SdfNormalizer),
        SourceFormat::Mjcf => Box::new(MjcfNormalizer),
        SourceFormat::Usd => Box::new(UsdNormalizer),
    }
}

fn load(path: &Path) -> Result<Robot> {
    let format = SourceFormat::from_path(path)?;
    let robot = normalizer_for(format)
        .parse(path)
        .with_context(|| format!("failed to read {format} file {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        %format,
        links = robot.links.len(),
        joints = robot.joints.len(),
        "loaded robot"
    );
    Ok(robot)
}

/// Run one comparison and return the rendered report.
pub fn run(args: &Args) -> Result<String> {
    for path in [&args.old, &args.new] {
        if !path.exists() {
            return Err(NormalizeError::FileNotFound { path: path.clone() }.into());
        }
    }

    let config = args.diff_config();
    config.validate()?;

    let old = load(&args.old)?;
    let new = load(&args.new)?;
    let diff = compare(&old, &new, &config);
    Ok(args.format.render(&diff, args.palette())?)
}
