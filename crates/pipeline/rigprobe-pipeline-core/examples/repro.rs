//! Runs every mode against the generic and humanoid fixture skeletons and logs
//! what was written next to what was read back.
//!
//! RUST_LOG=info cargo run -p rigprobe-pipeline-core --example repro

use anyhow::Result;
use rigprobe_animation_core::{Clip, Skeleton};
use rigprobe_api_core::{ModifyMode, Vec3};
use rigprobe_pipeline::{Controls, Pipeline, PipelineConfig};
use rigprobe_test_fixtures::pipelines;

fn target_for(mode: ModifyMode) -> Vec3 {
    match mode {
        ModifyMode::None => Vec3::ZERO,
        ModifyMode::Scale => Vec3::new(1.0, 2.0, 1.0),
        ModifyMode::Rotation => Vec3::new(0.0, 350.0, 0.0),
        ModifyMode::Position => Vec3::new(0.0, 1.0, 0.0),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    for fixture in ["head-generic", "head-humanoid"] {
        let (config, skeleton, clip): (PipelineConfig, Skeleton, Clip) =
            pipelines::load_all(fixture)?;
        let mut pipeline = Pipeline::start(config, skeleton, clip)?;
        let store = pipeline.store();

        for mode in ModifyMode::ALL {
            store.publish_controls(Controls {
                mode,
                target: target_for(mode),
                blend: 0.5,
            });
            let frame = pipeline.step(1.0 / 60.0)?;
            if let Some(report) = frame.report {
                log::info!(
                    "{fixture:<14} {:<8} written={:.2?} observed={:.2?} {}",
                    mode.as_str(),
                    report.expected.to_array(),
                    report.observed.to_array(),
                    if report.matches { "ok" } else { "DROPPED" }
                );
            }
        }
        pipeline.stop();
    }
    Ok(())
}
