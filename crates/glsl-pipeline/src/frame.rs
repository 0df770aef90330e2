use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::camera::SceneCamera;

/// Drawable size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, with a zero height treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Clock readings for one host frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameTiming {
    pub elapsed: Duration,
    pub delta: Duration,
    pub frame: u64,
}

/// Wall-clock frame counter owned by the host loop.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start_time: Instant,
    last_frame_time: Instant,
    frame_count: u64,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            start_time: now,
            last_frame_time: now,
            frame_count: 0,
        }
    }

    /// Records a frame at `now`. The first tick restarts the clock so time
    /// spent between construction and the first frame is not counted.
    pub fn tick(&mut self, now: Instant) -> FrameTiming {
        if self.frame_count == 0 {
            self.start_time = now;
            self.last_frame_time = now;
        }
        let elapsed = now.saturating_duration_since(self.start_time);
        let delta = now.saturating_duration_since(self.last_frame_time);
        self.last_frame_time = now;
        let frame = self.frame_count;
        self.frame_count = self.frame_count.saturating_add(1);
        FrameTiming {
            elapsed,
            delta,
            frame,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Read-only host context passed to renders and per-frame callbacks.
pub struct FrameState<'a, S> {
    pub scene: &'a S,
    pub camera: &'a SceneCamera,
    pub size: Size,
    pub timing: FrameTiming,
}

impl<'a, S> FrameState<'a, S> {
    pub fn new(scene: &'a S, camera: &'a SceneCamera, size: Size, timing: FrameTiming) -> Self {
        Self {
            scene,
            camera,
            size,
            timing,
        }
    }
}
