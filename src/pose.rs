//! Pose input
//!
//! The pose estimator is external; it delivers normalized landmarks per camera
//! frame. The engine only needs one point from them: the mouth centre.

use std::sync::mpsc::{Receiver, TryRecvError};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::Viewport;

/// Landmark index of the left mouth corner
pub const MOUTH_LEFT: usize = 9;
/// Landmark index of the right mouth corner
pub const MOUTH_RIGHT: usize = 10;

/// A normalized body landmark (x, y in [0, 1] of the camera frame)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }
}

/// All landmarks detected in one camera frame
pub type PoseFrame = Vec<Landmark>;

/// Supplier of the most recent pose
pub trait PoseSource {
    /// Latest landmarks, or `None` if nothing was detected
    fn latest(&mut self) -> Option<PoseFrame>;
}

/// Mapping from normalized landmarks to viewport pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureMapping {
    /// Mirror horizontally (selfie camera)
    pub mirror_x: bool,
    pub visibility_threshold: f32,
}

impl CaptureMapping {
    /// Mouth centre in viewport pixels. Absent if either corner is missing or
    /// less visible than the threshold.
    pub fn capture_point(&self, landmarks: &[Landmark], viewport: &Viewport) -> Option<Vec2> {
        let left = landmarks.get(MOUTH_LEFT)?;
        let right = landmarks.get(MOUTH_RIGHT)?;
        if left.visibility < self.visibility_threshold || right.visibility < self.visibility_threshold {
            return None;
        }

        let cx = (left.x + right.x) / 2.0;
        let cy = (left.y + right.y) / 2.0;
        let x = if self.mirror_x { 1.0 - cx } else { cx };
        Some(Vec2::new(x * viewport.width, cy * viewport.height))
    }
}

/// Pose source fed by a producer thread over a channel. Only the newest
/// frame matters; older ones are discarded.
#[derive(Debug)]
pub struct ChannelPoseSource {
    rx: Receiver<PoseFrame>,
    last: Option<PoseFrame>,
}

impl ChannelPoseSource {
    pub fn new(rx: Receiver<PoseFrame>) -> Self {
        Self { rx, last: None }
    }
}

impl PoseSource for ChannelPoseSource {
    fn latest(&mut self) -> Option<PoseFrame> {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => self.last = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.last.is_some() {
                        log::debug!("Pose producer disconnected");
                    }
                    self.last = None;
                    break;
                }
            }
        }
        self.last.clone()
    }
}

/// No camera: never yields a pose
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPose;

impl PoseSource for NoPose {
    fn latest(&mut self) -> Option<PoseFrame> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    const VIEW: Viewport = Viewport {
        width: 1000.0,
        height: 500.0,
    };

    fn face(left: Landmark, right: Landmark) -> PoseFrame {
        let mut frame = vec![Landmark::default(); 33];
        frame[MOUTH_LEFT] = left;
        frame[MOUTH_RIGHT] = right;
        frame
    }

    fn mapping(mirror_x: bool) -> CaptureMapping {
        CaptureMapping {
            mirror_x,
            visibility_threshold: 0.5,
        }
    }

    #[test]
    fn test_midpoint_mirrored() {
        let frame = face(Landmark::new(0.2, 0.4, 0.9), Landmark::new(0.4, 0.6, 0.9));
        let p = mapping(true).capture_point(&frame, &VIEW).unwrap();
        assert!((p.x - 700.0).abs() < 1e-3);
        assert!((p.y - 250.0).abs() < 1e-3);

        let p = mapping(false).capture_point(&frame, &VIEW).unwrap();
        assert!((p.x - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_low_visibility_is_absent() {
        let frame = face(Landmark::new(0.2, 0.4, 0.49), Landmark::new(0.4, 0.6, 0.9));
        assert!(mapping(true).capture_point(&frame, &VIEW).is_none());
        // Threshold itself counts as visible
        let frame = face(Landmark::new(0.2, 0.4, 0.5), Landmark::new(0.4, 0.6, 0.5));
        assert!(mapping(true).capture_point(&frame, &VIEW).is_some());
    }

    #[test]
    fn test_short_frame_is_absent() {
        let frame = vec![Landmark::new(0.5, 0.5, 1.0); 10];
        assert!(mapping(true).capture_point(&frame, &VIEW).is_none());
    }

    #[test]
    fn test_channel_keeps_newest() {
        let (tx, rx) = mpsc::channel();
        let mut source = ChannelPoseSource::new(rx);
        assert!(source.latest().is_none());

        tx.send(vec![Landmark::new(0.1, 0.1, 1.0)]).unwrap();
        tx.send(vec![Landmark::new(0.9, 0.9, 1.0)]).unwrap();
        assert_eq!(source.latest().unwrap()[0].x, 0.9);
        // Held until a newer frame arrives
        assert_eq!(source.latest().unwrap()[0].x, 0.9);

        drop(tx);
        assert!(source.latest().is_none());
    }
}
