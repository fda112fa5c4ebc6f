use clap::Parser;
use lidar_sim::common::Color;
use lidar_sim::io::{self, FsSink};
use lidar_sim::scene::{ParryScene, SceneObject, Surface, Texture2, UvProjection};
use lidar_sim::sensors::{ExternalLidar, FixedPose, ScanOutcome};
use lidar_sim::{Iso3, Point3, SensorConfig, Vector3};
use log::{debug, info, warn};
use parry3d_f64::shape::SharedShape;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scans a demo scene with a simulated LiDAR", long_about = None)]
struct Args {
    /// JSON sensor configuration, unset fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of scan lines per frame
    #[arg(long)]
    lines: Option<usize>,

    /// Number of points per scan line
    #[arg(long)]
    points: Option<usize>,

    /// Maximum range in scene units
    #[arg(long)]
    radius: Option<f64>,

    /// Standard deviation of the range noise
    #[arg(long)]
    noise: Option<f64>,

    /// Radial fisheye distortion strength, 0 disables it
    #[arg(long)]
    fisheye: Option<f64>,

    /// Seed for the noise generator
    #[arg(long)]
    seed: Option<u64>,

    /// Number of frames to capture
    #[arg(short = 'n', long, default_value = "1")]
    frames: usize,

    /// Folder to write frame PLY files and reports to, overriding the configured folder
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Skip the packet and frame end delays
    #[arg(long)]
    no_delays: bool,
}

fn build_config(args: &Args) -> lidar_sim::Result<SensorConfig> {
    let mut config = match &args.config {
        Some(path) => SensorConfig::from_json_file(path)?,
        None => SensorConfig::default(),
    };

    if let Some(v) = args.lines {
        config.set_line_count(v)?;
    }
    if let Some(v) = args.points {
        config.set_points_per_line(v)?;
    }
    if let Some(v) = args.radius {
        config.set_scan_radius(v)?;
    }
    if let Some(v) = args.noise {
        config.set_noise_std_dev(v)?;
    }
    if let Some(v) = args.fisheye {
        config.set_fisheye_strength(v)?;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(out) = &args.out {
        config.auto_save.folder = out.clone();
    }
    if args.no_delays {
        config.set_delays_enabled(false);
    }

    Ok(config)
}

/// A checkered wall ahead of the sensor, a gray floor below it, and a bare sphere in between
fn demo_scene() -> ParryScene {
    let checker = Arc::new(Texture2::checkerboard(
        8,
        4,
        Color::rgb(0.9, 0.9, 0.9),
        Color::rgb(0.1, 0.2, 0.6),
    ));

    ParryScene::new()
        .with_object(SceneObject::new(
            SharedShape::cuboid(20.0, 10.0, 0.5),
            Iso3::translation(0.0, 5.0, 30.5),
            Surface::Textured {
                texture: checker,
                projection: UvProjection::new(
                    Point3::new(-20.0, -10.0, 0.0),
                    Vector3::new(40.0, 0.0, 0.0),
                    Vector3::new(0.0, 20.0, 0.0),
                ),
            },
        ))
        .with_object(SceneObject::new(
            SharedShape::cuboid(50.0, 0.5, 50.0),
            Iso3::translation(0.0, -0.5, 0.0),
            Surface::Flat(Color::rgb(0.4, 0.4, 0.4)),
        ))
        .with_object(SceneObject::new(
            SharedShape::ball(2.0),
            Iso3::translation(4.0, 2.0, 12.0),
            Surface::Bare,
        ))
}

#[tokio::main]
async fn main() -> lidar_sim::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = build_config(&args)?;
    debug!("Sensor configuration: {}", config.to_json_string()?);

    let pose = FixedPose(Iso3::translation(0.0, 1.5, 0.0));
    let lidar = ExternalLidar::new(config, Arc::new(demo_scene()), pose)?;
    lidar.on_packet(|p| {
        debug!(
            "Line {} ({}) captured {} points",
            p.line_index,
            p.direction.short_label(),
            p.len()
        )
    });

    for _ in 0..args.frames {
        match lidar.scan_frame().await {
            ScanOutcome::Completed(frame) => info!(
                "Frame {}: {} points in {:.3}s",
                frame.frame_index,
                frame.total_points(),
                frame.duration().unwrap_or_default()
            ),
            other => warn!("Frame was not completed: {other:?}"),
        }
    }

    // Without auto-save, still leave the last frame behind when an output folder was given
    let config = lidar.config();
    if let (Some(out), false) = (&args.out, config.auto_save.is_enabled()) {
        let frame = lidar.current_frame();
        io::write_frame_ply(&FsSink, &out.join("last_frame.ply"), frame.as_ref(), true)?;
    }

    Ok(())
}
