//! Neon Pulse demo entry point
//!
//! Plays one headless round: music on the default output device (if any),
//! a synthetic player sweeping their head across the frame, and the game
//! events logged as they happen.
//!
//! Usage: `neon-pulse [settings.json]`

use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use neon_pulse::commentary::CannedCommentary;
use neon_pulse::pose::{ChannelPoseSource, Landmark, MOUTH_LEFT, MOUTH_RIGHT, PoseFrame};
use neon_pulse::sim::{GamePhase, ImageRef, Viewport};
use neon_pulse::{FrameOrchestrator, GameListener, Session, Settings};

const FRAME_DT: f32 = 1.0 / 60.0;
/// Landmarks per pose frame
const POSE_LANDMARKS: usize = 33;
/// Pose estimators typically lag the display
const POSE_PERIOD: Duration = Duration::from_millis(33);

/// Logs every callback
struct LogListener;

impl GameListener for LogListener {
    fn on_score_changed(&mut self, score: u32) {
        log::info!("Score: {score}");
    }

    fn on_milestone(&mut self, score: u32) {
        log::info!("Milestone reached at {score}");
    }

    fn on_commentary(&mut self, text: &str) {
        log::info!("Commentary: {text}");
    }

    fn on_round_over(&mut self, score: u32) {
        log::info!("Time! Final score {score}");
    }
}

/// Feed a mouth that traces a slow figure-eight until the receiver hangs up
fn spawn_pose_producer(tx: Sender<PoseFrame>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let started = Instant::now();
        loop {
            let t = started.elapsed().as_secs_f32();
            let cx = 0.5 + 0.35 * (t * 0.9).sin();
            let cy = 0.55 + 0.3 * (t * 1.8).sin();

            let mut frame = vec![Landmark::default(); POSE_LANDMARKS];
            frame[MOUTH_LEFT] = Landmark::new(cx - 0.02, cy, 0.95);
            frame[MOUTH_RIGHT] = Landmark::new(cx + 0.02, cy, 0.95);
            if tx.send(frame).is_err() {
                break;
            }
            thread::sleep(POSE_PERIOD);
        }
    })
}

fn main() {
    env_logger::init();
    log::info!("Neon Pulse (native demo) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };

    let (pose_tx, pose_rx) = mpsc::channel();
    let producer = spawn_pose_producer(pose_tx);

    let orchestrator = FrameOrchestrator::new(
        settings.clone(),
        Box::new(ChannelPoseSource::new(pose_rx)),
        Some(Arc::new(CannedCommentary::default())),
        Box::new(LogListener),
    );
    let mut session = Session::open_default(settings, orchestrator, Viewport::new(1280.0, 720.0));
    session.set_images(vec![
        ImageRef::new(0, 256, 256),
        ImageRef::new(1, 320, 240),
        ImageRef::new(2, 200, 300),
    ]);

    session.start();
    let frame_period = Duration::from_secs_f32(FRAME_DT);
    let mut peak_scale = 1.0f32;
    while session.state().phase == GamePhase::Playing {
        let frame_start = Instant::now();
        let frame = session.frame(FRAME_DT);
        peak_scale = peak_scale.max(frame.beat_scale);
        if session.state().frame_count % 60 == 0 {
            log::debug!(
                "t-{:.1}s score {} targets {} particles {} pulse {:.2}",
                frame.time_left,
                frame.score,
                frame.targets.len(),
                frame.particles.len(),
                frame.beat_scale
            );
        }
        if let Some(rest) = frame_period.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    // Give a late commentary reply a moment to arrive
    let linger = Instant::now();
    while linger.elapsed() < Duration::from_millis(500) {
        session.frame(FRAME_DT);
        thread::sleep(frame_period);
    }

    session.stop();
    log::info!(
        "Final score {} (peak pulse {peak_scale:.2})",
        session.state().score
    );

    drop(session);
    if producer.join().is_err() {
        log::warn!("Pose producer panicked");
    }
}
