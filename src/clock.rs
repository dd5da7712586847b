// The render loop's time source. One Ticker per loop; every iteration calls
// `tick()` exactly once and hands the result to whoever needs time. There is
// no per-frame callback registry — the loop owns the clock.

use std::time::Instant;

/// One frame's worth of time: seconds since start and since the last tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Seconds accumulated while unpaused; drives the `time` uniform.
    pub elapsed: f32,
    /// Seconds since the previous tick; zero while paused.
    pub delta: f32,
}

pub struct Ticker {
    last: Instant,
    elapsed: f32,
    paused: bool,
}

impl Ticker {
    pub fn new() -> Self {
        Self { last: Instant::now(), elapsed: 0.0, paused: false }
    }

    /// Advance the clock. While paused, wall time passes but elapsed does not,
    /// so the animation freezes without losing its place.
    pub fn tick(&mut self) -> Tick {
        let now = Instant::now();
        let dt = (now - self.last).as_secs_f32();
        self.last = now;
        if self.paused {
            return Tick { elapsed: self.elapsed, delta: 0.0 };
        }
        self.elapsed += dt;
        Tick { elapsed: self.elapsed, delta: dt }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
