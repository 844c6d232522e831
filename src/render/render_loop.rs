//! Owned handle for the per-frame render loop

use crate::core::time::FrameTimer;

/// Start/stop handle for continuous redraws
///
/// The window event loop asks [`RenderLoop::tick`] each frame; a stopped loop
/// yields nothing, so no further frames are drawn. Dropping the handle stops
/// the loop.
pub struct RenderLoop {
    running: bool,
    timer: FrameTimer,
}

impl RenderLoop {
    /// A stopped loop
    pub fn new() -> Self {
        Self {
            running: false,
            timer: FrameTimer::new(),
        }
    }

    /// Begin issuing frames; returns false if already running
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.timer.reset();
        self.running = true;
        log::info!("Render loop started");
        true
    }

    /// Stop issuing frames; returns false if already stopped
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        log::info!("Render loop stopped after {} frames", self.timer.frame_count());
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance one frame, returning its delta time in seconds
    pub fn tick(&mut self) -> Option<f32> {
        if !self.running {
            return None;
        }
        if self.timer.tick() {
            log::debug!("{:.1} fps", self.timer.fps());
        }
        Some(self.timer.delta_secs())
    }

    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
