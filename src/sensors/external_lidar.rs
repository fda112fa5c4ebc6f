//! The simulated external LiDAR. A frame is captured one scan line at a time: every line is traced
//! against the scene oracle in a bidirectional sweep, turned into a timestamped packet, and
//! appended to the frame in progress before the sensor waits out the inter-packet delay. Once the
//! last line is in, the sensor waits out the frame end delay, closes the frame, notifies
//! listeners, and optionally saves the frame to disk.
//!
//! Only one frame may be in progress at a time. A scan request made while another is running is
//! rejected, and `stop` interrupts a running scan at its next suspension point.

use crate::config::{AutoSave, SensorConfig};
use crate::errors::ConfigError;
use crate::frame::{LidarFrame, LidarPacket, LidarPoint};
use crate::io::{self, FileSink, FsSink};
use crate::scene::{SceneHit, SceneOracle};
use crate::sensors::{Clock, PoseSource, RangeSampler, ScanPattern, SimClock};
use crate::{Iso3, Point3, UnitVec3};
use log::{debug, error, info};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub type PacketListener = Box<dyn Fn(&LidarPacket) + Send + Sync>;
pub type FrameListener = Box<dyn Fn(&LidarFrame) + Send + Sync>;

/// How a scan request ended
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Every line was captured and the frame was closed
    Completed(LidarFrame),

    /// The scan was stopped before the frame was closed. The partial frame stays available
    /// through `current_frame` with its end time unset.
    Cancelled,

    /// Another frame was already in progress, so nothing was done
    Rejected,
}

enum ScanState {
    Idle,
    Scanning {
        generation: u64,
        cancel: watch::Sender<bool>,
    },
}

struct ScanData {
    state: ScanState,
    generation: u64,
    next_frame_index: u64,
    current_frame: Option<LidarFrame>,
    point_cloud: Arc<Vec<LidarPoint>>,
    rng: StdRng,
}

impl ScanData {
    fn is_active(&self, generation: u64) -> bool {
        matches!(self.state, ScanState::Scanning { generation: g, .. } if g == generation)
    }

    fn release(&mut self, generation: u64) {
        if self.is_active(generation) {
            self.state = ScanState::Idle;
        }
    }
}

/// Returns the sensor to idle if a scan future is dropped before it finishes
struct ScanGuard<'a> {
    data: &'a Mutex<ScanData>,
    generation: u64,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.data.lock().release(self.generation);
    }
}

/// Everything a claimed scan needs to run
struct ScanTicket {
    generation: u64,
    cancel: watch::Receiver<bool>,
    config: SensorConfig,
}

struct Shared<S: ?Sized, P, C> {
    pose: P,
    clock: C,
    config: RwLock<SensorConfig>,
    data: Mutex<ScanData>,
    packet_listeners: RwLock<Vec<PacketListener>>,
    frame_listeners: RwLock<Vec<FrameListener>>,
    sink: RwLock<Arc<dyn FileSink>>,
    scene: Arc<S>,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Waits out `delay` unless the scan is cancelled first. Returns `false` on cancellation.
async fn suspend(delay: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if *cancel.borrow() {
        return false;
    }
    let elapsed = tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.changed() => false,
    };
    elapsed && !*cancel.borrow()
}

/// A simulated scanning LiDAR mounted somewhere in a scene.
///
/// The handle is cheap to clone and every clone drives the same sensor. The scene, the pose
/// source, and the clock are collaborators supplied at construction, so the sensor can be moved
/// around while it scans and tests can run on a paused clock.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use lidar_sim::scene::ParryScene;
/// use lidar_sim::sensors::{ExternalLidar, FixedPose, ScanOutcome};
/// use lidar_sim::SensorConfig;
///
/// # async fn run() -> lidar_sim::Result<()> {
/// let lidar = ExternalLidar::new(SensorConfig::default(), Arc::new(ParryScene::new()), FixedPose::identity())?;
/// if let ScanOutcome::Completed(frame) = lidar.scan_frame().await {
///     println!("{} points", frame.total_points());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ExternalLidar<S: ?Sized, P, C = SimClock> {
    shared: Arc<Shared<S, P, C>>,
}

impl<S: ?Sized, P, C> Clone for ExternalLidar<S, P, C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S, P> ExternalLidar<S, P, SimClock>
where
    S: SceneOracle + ?Sized,
    P: PoseSource,
{
    /// Creates a sensor which measures time from the moment it was built. Fails if the
    /// configuration does not validate.
    pub fn new(config: SensorConfig, scene: Arc<S>, pose: P) -> Result<Self, ConfigError> {
        Self::with_clock(config, scene, pose, SimClock::new())
    }
}

impl<S, P, C> ExternalLidar<S, P, C>
where
    S: SceneOracle + ?Sized,
    P: PoseSource,
    C: Clock,
{
    pub fn with_clock(
        config: SensorConfig,
        scene: Arc<S>,
        pose: P,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let data = ScanData {
            state: ScanState::Idle,
            generation: 0,
            next_frame_index: 0,
            current_frame: None,
            point_cloud: Arc::new(Vec::new()),
            rng: make_rng(config.seed),
        };

        Ok(Self {
            shared: Arc::new(Shared {
                pose,
                clock,
                config: RwLock::new(config),
                data: Mutex::new(data),
                packet_listeners: RwLock::new(Vec::new()),
                frame_listeners: RwLock::new(Vec::new()),
                sink: RwLock::new(Arc::new(FsSink)),
                scene,
            }),
        })
    }

    /// Replaces the sink that auto-saved files are written through
    pub fn with_sink(self, sink: Arc<dyn FileSink>) -> Self {
        self.set_sink(sink);
        self
    }

    pub fn set_sink(&self, sink: Arc<dyn FileSink>) {
        *self.shared.sink.write() = sink;
    }

    /// Registers a callback invoked with every packet as soon as it has been appended to the
    /// frame in progress. Listeners must not register further listeners.
    pub fn on_packet<F>(&self, listener: F)
    where
        F: Fn(&LidarPacket) + Send + Sync + 'static,
    {
        self.shared.packet_listeners.write().push(Box::new(listener));
    }

    /// Registers a callback invoked once with every completed frame
    pub fn on_frame<F>(&self, listener: F)
    where
        F: Fn(&LidarFrame) + Send + Sync + 'static,
    {
        self.shared.frame_listeners.write().push(Box::new(listener));
    }

    // ==============================================================================================
    // Queries
    // ==============================================================================================

    pub fn is_scanning(&self) -> bool {
        matches!(self.shared.data.lock().state, ScanState::Scanning { .. })
    }

    /// True when no scan is running and the most recent frame holds at least one packet
    pub fn is_data_ready(&self) -> bool {
        let data = self.shared.data.lock();
        matches!(data.state, ScanState::Idle)
            && data
                .current_frame
                .as_ref()
                .is_some_and(|f| !f.packets().is_empty())
    }

    /// A copy of the most recent frame, which may still be in progress or may have been cancelled
    pub fn current_frame(&self) -> Option<LidarFrame> {
        self.shared.data.lock().current_frame.clone()
    }

    /// The flattened points of the last completed frame
    pub fn point_cloud(&self) -> Arc<Vec<LidarPoint>> {
        self.shared.data.lock().point_cloud.clone()
    }

    pub fn config(&self) -> SensorConfig {
        self.shared.config.read().clone()
    }

    pub fn lidar_pose(&self) -> Iso3 {
        self.shared.pose.pose()
    }

    pub fn scan_radius(&self) -> f64 {
        self.shared.config.read().scan_radius()
    }

    pub fn vertical_fov(&self) -> f64 {
        self.shared.config.read().vertical_fov()
    }

    pub fn horizontal_fov(&self) -> f64 {
        self.shared.config.read().horizontal_fov()
    }

    /// The number of scan lines in a frame
    pub fn channel_count(&self) -> usize {
        self.shared.config.read().line_count()
    }

    /// Applies changes to the configuration. The changes are made to a copy and only committed if
    /// every one of them succeeds, so a rejected value leaves the configuration untouched. A scan
    /// already in progress keeps the configuration it started with.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use lidar_sim::scene::ParryScene;
    /// # use lidar_sim::sensors::{ExternalLidar, FixedPose};
    /// # use lidar_sim::SensorConfig;
    /// # let lidar = ExternalLidar::new(SensorConfig::default(), Arc::new(ParryScene::new()), FixedPose::identity()).unwrap();
    /// lidar.configure(|c| {
    ///     c.set_line_count(16)?;
    ///     c.set_noise_std_dev(0.0)
    /// }).unwrap();
    /// ```
    pub fn configure<F>(&self, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut SensorConfig) -> Result<(), ConfigError>,
    {
        let mut config = self.shared.config.write();
        let mut updated = config.clone();
        f(&mut updated)?;
        updated.validate().inspect_err(|e| error!("Rejected sensor configuration: {e}"))?;

        if updated.seed != config.seed {
            self.shared.data.lock().rng = make_rng(updated.seed);
        }
        *config = updated;
        Ok(())
    }

    // ==============================================================================================
    // Scanning
    // ==============================================================================================

    /// Captures one full frame. Returns `Rejected` immediately if a frame is already in progress.
    pub async fn scan_frame(&self) -> ScanOutcome {
        match self.begin_scan() {
            Some(ticket) => self.run_scan(ticket).await,
            None => ScanOutcome::Rejected,
        }
    }

    /// Interrupts the frame in progress. The scan stops at its next suspension point without
    /// notifying frame listeners. Returns `true` if a scan was running.
    pub fn stop(&self) -> bool {
        let mut data = self.shared.data.lock();
        match std::mem::replace(&mut data.state, ScanState::Idle) {
            ScanState::Scanning { cancel, .. } => {
                // The receiver may already be gone if the scan future was dropped
                let _ = cancel.send(true);
                info!("LiDAR scan stopped");
                true
            }
            ScanState::Idle => false,
        }
    }

    /// Claims the sensor for a new frame, or returns `None` if a frame is already in progress
    fn begin_scan(&self) -> Option<ScanTicket> {
        let config = self.config();
        let mut data = self.shared.data.lock();
        if let ScanState::Scanning { .. } = data.state {
            debug!("Scan request ignored, a frame is already in progress");
            return None;
        }

        data.generation += 1;
        let generation = data.generation;
        let (tx, rx) = watch::channel(false);
        data.state = ScanState::Scanning {
            generation,
            cancel: tx,
        };

        let frame_index = data.next_frame_index;
        data.next_frame_index += 1;
        data.current_frame = Some(LidarFrame::new(frame_index, self.shared.clock.now()));

        Some(ScanTicket {
            generation,
            cancel: rx,
            config,
        })
    }

    async fn run_scan(&self, ticket: ScanTicket) -> ScanOutcome {
        let ScanTicket {
            generation,
            mut cancel,
            config,
        } = ticket;
        let _guard = ScanGuard {
            data: &self.shared.data,
            generation,
        };

        let pattern = ScanPattern::new(&config);
        let sampler = RangeSampler::new(&config);
        debug!(
            "Starting LiDAR frame: {} lines, {} points per line",
            pattern.line_count(),
            pattern.points_per_line()
        );

        for line in 0..pattern.line_count() {
            let Some(packet) = self.capture_line(generation, &pattern, &sampler, line) else {
                return ScanOutcome::Cancelled;
            };
            debug!(
                "Packet {}/{}: {} points, direction {}, time {:.3}s",
                line + 1,
                pattern.line_count(),
                packet.len(),
                packet.direction.short_label(),
                packet.timestamp
            );
            self.notify_packet(&packet);

            if let Some(delay) = config.packet_delay() {
                if !suspend(delay, &mut cancel).await {
                    return ScanOutcome::Cancelled;
                }
            }
        }

        if let Some(delay) = config.frame_end_delay() {
            if !suspend(delay, &mut cancel).await {
                return ScanOutcome::Cancelled;
            }
        }

        let Some(frame) = self.finish_frame(generation) else {
            return ScanOutcome::Cancelled;
        };
        info!(
            "LiDAR frame {} completed: {} packets, {} points",
            frame.frame_index,
            frame.packets().len(),
            frame.total_points()
        );
        self.notify_frame(&frame);
        self.auto_save(&config, &frame).await;

        self.shared.data.lock().release(generation);
        ScanOutcome::Completed(frame)
    }

    /// Traces one scan line and appends it to the frame in progress. Returns `None` if the scan
    /// was stopped while the line was being traced.
    fn capture_line(
        &self,
        generation: u64,
        pattern: &ScanPattern,
        sampler: &RangeSampler,
        line: usize,
    ) -> Option<LidarPacket> {
        let pose = self.shared.pose.pose();
        let position = Point3::from(pose.translation.vector);
        let orientation = pose.rotation;
        let timestamp = self.shared.clock.now();

        let (direction, indices) = pattern.traversal(line);
        let rays = indices
            .iter()
            .map(|&i| pattern.world_direction(&orientation, line, i))
            .collect::<Vec<UnitVec3>>();

        let scene = self.shared.scene.as_ref();
        let hits = rays
            .par_iter()
            .map(|d| sampler.cast(&position, d, scene))
            .collect::<Vec<Option<SceneHit>>>();

        let mut guard = self.shared.data.lock();
        if !guard.is_active(generation) {
            return None;
        }
        let data = &mut *guard;

        // Noise is drawn in emission order so a seeded sensor is reproducible
        let points = hits
            .iter()
            .zip(rays.iter())
            .filter_map(|(hit, d)| {
                hit.as_ref()
                    .map(|h| sampler.point_from_hit(h, d, &mut data.rng))
            })
            .collect();

        let packet = LidarPacket {
            line_index: line,
            direction,
            points,
            timestamp,
            sensor_position: position,
            sensor_rotation: orientation,
        };

        data.current_frame.as_mut()?.push_packet(packet.clone());
        Some(packet)
    }

    /// Closes the frame in progress and publishes its point cloud
    fn finish_frame(&self, generation: u64) -> Option<LidarFrame> {
        let end = self.shared.clock.now();
        let mut data = self.shared.data.lock();
        if !data.is_active(generation) {
            return None;
        }

        let frame = data.current_frame.as_mut()?;
        frame.finish(end);
        let frame = frame.clone();
        data.point_cloud = Arc::new(frame.point_cloud());
        Some(frame)
    }

    fn notify_packet(&self, packet: &LidarPacket) {
        for listener in self.shared.packet_listeners.read().iter() {
            listener(packet);
        }
    }

    fn notify_frame(&self, frame: &LidarFrame) {
        for listener in self.shared.frame_listeners.read().iter() {
            listener(frame);
        }
    }

    /// Writes the enabled auto-save files on tokio's blocking pool, since sinks may block.
    /// Failures are logged and never interrupt scanning.
    async fn auto_save(&self, config: &SensorConfig, frame: &LidarFrame) {
        if !config.auto_save.is_enabled() {
            return;
        }
        let auto = config.auto_save.clone();
        let sink = self.shared.sink.read().clone();
        let frame = frame.clone();
        let task = tokio::task::spawn_blocking(move || save_frame(sink.as_ref(), &auto, &frame));
        if let Err(e) = task.await {
            error!("Auto-save task failed: {e}");
        }
    }
}

fn save_frame(sink: &dyn FileSink, auto: &AutoSave, frame: &LidarFrame) {
    if auto.ply {
        let path = auto
            .folder
            .join(format!("lidar_frame_{:06}.ply", frame.frame_index));
        if let Err(e) = io::write_frame_ply(sink, &path, Some(frame), auto.include_packet_comments) {
            error!("{e}");
        }
    }

    if auto.packet_info {
        let path = auto
            .folder
            .join(format!("packet_info_{:06}.txt", frame.frame_index));
        if let Err(e) = io::write_frame_report(sink, &path, Some(frame)) {
            error!("{e}");
        }
    }
}

impl<S, P, C> ExternalLidar<S, P, C>
where
    S: SceneOracle + ?Sized + 'static,
    P: PoseSource + 'static,
    C: Clock + 'static,
{
    /// Starts capturing a frame on the tokio runtime if no frame is in progress. Returns the
    /// handle of the spawned scan, or `None` if the request was rejected. Must be called from
    /// within a tokio runtime.
    pub fn update(&self) -> Option<JoinHandle<ScanOutcome>> {
        let ticket = self.begin_scan()?;
        let this = self.clone();
        Some(tokio::spawn(async move { this.run_scan(ticket).await }))
    }
}
