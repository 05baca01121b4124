//! Frame animation over a sprite's active image set.

use bevy_ecs::prelude::Component;

/// Playback state of a frame animation.
///
/// Frames live on the sprite; this only tracks which one is shown and how
/// long it has been on screen.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Animation {
    pub enabled: bool,
    /// Index of the shown frame. `None` until a frame was selected.
    pub curr_img: Option<usize>,
    pub img_start: usize,
    pub img_end: usize,
    /// Frame time used when a set does not specify one, in milliseconds.
    pub time_default: u32,
    /// Unscaled milliseconds accumulated on the current frame.
    pub counter: u32,
    /// Playback speed modifier.
    pub speed: f32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            enabled: false,
            curr_img: None,
            img_start: 0,
            img_end: 0,
            time_default: 1000,
            counter: 0,
            speed: 1.0,
        }
    }
}

impl Animation {
    /// Forget the time spent on the current frame.
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    pub fn set_range(&mut self, start: usize, end: usize) {
        self.img_start = start;
        self.img_end = end.max(start);
    }

    /// Advance by `elapsed` milliseconds given the frame times.
    ///
    /// Returns the frame to switch to, if any.
    pub fn advance(&mut self, frame_times: &[u32], elapsed: u32) -> Option<usize> {
        if !self.enabled || self.img_start == self.img_end || self.speed <= 0.0 {
            return None;
        }

        self.counter = self.counter.saturating_add(elapsed);

        let curr = match self.curr_img {
            Some(i) if i < frame_times.len() => i,
            _ => return Some(self.img_start),
        };

        let scaled = (self.counter as f32 * self.speed) as u32;
        let time = frame_times[curr];
        if scaled < time {
            return None;
        }

        // keep the leftover in unscaled ticks, the next step scales it again
        self.counter = ((scaled - time) as f32 / self.speed) as u32;
        if curr >= self.img_end {
            Some(self.img_start)
        } else {
            Some(curr + 1)
        }
    }
}
