//! vision-sim - Simulated vision producer
//!
//! Stands in for the camera perception core during development: synthesizes
//! eye-closure, yawn and head-pose signals for a chosen driver profile,
//! smooths eye closure into PERCLOS over a sliding window, and streams the
//! resulting observations to the fusion server as newline-delimited JSON.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use cogni_common::{HeadPose, VisionObservation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, warn};

/// Frames in the PERCLOS window (2 s at 30 fps)
const PERCLOS_WINDOW_FRAMES: usize = 60;

/// Fastest frame pacing; a zero period would panic the interval timer
const MIN_FRAME_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Profile {
    /// Eyes open apart from normal blinks, facing the road
    Alert,
    /// Long eye closures, yawning, head nodding down
    Drowsy,
    /// Alert eyes, head frequently turned away
    Distracted,
}

impl Profile {
    /// Per-frame probability that the eyes are closed
    fn eye_closed_probability(self) -> f64 {
        match self {
            Profile::Alert | Profile::Distracted => 0.03,
            Profile::Drowsy => 0.25,
        }
    }

    fn yawn_probability(self) -> f64 {
        match self {
            Profile::Alert | Profile::Distracted => 0.0,
            Profile::Drowsy => 0.1,
        }
    }

    /// Head pitch and yaw in degrees
    fn head_angles(self, rng: &mut StdRng) -> (f64, f64) {
        match self {
            Profile::Alert => (rng.gen_range(-5.0..5.0), rng.gen_range(-8.0..8.0)),
            Profile::Drowsy => (rng.gen_range(0.0..14.0), rng.gen_range(-8.0..8.0)),
            Profile::Distracted => (rng.gen_range(-5.0..5.0), rng.gen_range(-40.0..40.0)),
        }
    }
}

/// Command-line arguments for vision-sim
#[derive(Parser, Debug)]
#[command(name = "vision-sim")]
#[command(about = "Simulated vision producer for the CogniShield fusion server")]
#[command(version)]
struct Args {
    /// Fusion server host
    #[arg(long, default_value = "127.0.0.1", env = "COGNI_HOST")]
    host: String,

    /// Fusion server port
    #[arg(short, long, default_value_t = 65432, env = "COGNI_PORT")]
    port: u16,

    /// Frames per second
    #[arg(long, default_value_t = 30.0)]
    rate_hz: f64,

    /// Stop after this many frames (default: run until interrupted)
    #[arg(long)]
    frames: Option<u64>,

    /// Driver behavior to simulate
    #[arg(long, value_enum, default_value_t = Profile::Alert)]
    profile: Profile,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

/// Sliding window of eye-closed flags
struct PerclosWindow {
    frames: VecDeque<bool>,
    capacity: usize,
}

impl PerclosWindow {
    fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one frame and return the fraction of closed frames in the window
    fn push(&mut self, eyes_closed: bool) -> f64 {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(eyes_closed);
        let closed = self.frames.iter().filter(|c| **c).count();
        closed as f64 / self.frames.len() as f64
    }
}

/// Synthesizes observations for one profile
struct Generator {
    profile: Profile,
    rng: StdRng,
    window: PerclosWindow,
}

impl Generator {
    fn new(profile: Profile, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            profile,
            rng,
            window: PerclosWindow::new(PERCLOS_WINDOW_FRAMES),
        }
    }

    fn next_observation(&mut self) -> Result<VisionObservation> {
        let eyes_closed = self.rng.gen_bool(self.profile.eye_closed_probability());
        let perclos = self.window.push(eyes_closed);
        let yawn = self.rng.gen_bool(self.profile.yawn_probability());
        let (pitch, yaw) = self.profile.head_angles(&mut self.rng);
        let pose = HeadPose::from_euler(pitch, yaw);

        // Head pose doubles as the gaze proxy
        let observation = VisionObservation::new(perclos, yawn, pose != HeadPose::Forward, pose)?;
        Ok(observation)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let period = frame_period(args.rate_hz)?;

    let addr = format!("{}:{}", args.host, args.port);
    info!(
        "vision-sim v{}: profile {:?} at {} Hz",
        env!("CARGO_PKG_VERSION"),
        args.profile,
        args.rate_hz
    );

    let mut socket = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("Failed to connect to fusion server at {}", addr))?;
    socket.set_nodelay(true)?;
    info!("Connected to fusion server at {}", addr);

    let mut generator = Generator::new(args.profile, args.seed);
    let mut ticker = tokio::time::interval(period);
    let mut sent: u64 = 0;

    loop {
        if args.frames.is_some_and(|limit| sent >= limit) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping");
                break;
            }
        }

        let observation = generator.next_observation()?;
        if let Err(e) = socket.write_all(observation.to_frame().as_bytes()).await {
            warn!("Connection to fusion server lost: {}", e);
            break;
        }
        sent += 1;

        if sent % 30 == 0 {
            info!(
                "Sent {} frames (PERCLOS {:.2}, pose {})",
                sent, observation.perclos, observation.head_pose
            );
        }
    }

    socket.shutdown().await.ok();
    info!("vision-sim done, {} frames sent", sent);
    Ok(())
}

/// Interval between frames, floored at 1 ms
fn frame_period(rate_hz: f64) -> Result<Duration> {
    if !(rate_hz.is_finite() && rate_hz > 0.0) {
        bail!("--rate-hz must be a positive number, got {}", rate_hz);
    }
    let period = Duration::try_from_secs_f64(1.0 / rate_hz)
        .with_context(|| format!("--rate-hz {} is too low", rate_hz))?;
    Ok(period.max(MIN_FRAME_PERIOD))
}
