use foundation::time::Time;

/// Frame metadata handed to per-frame updates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time since the previous frame (seconds).
    pub dt_s: f64,
    /// Clock time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    /// Fixed-step frame, used by tests and replays.
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn next(self) -> Self {
        Self {
            index: self.index + 1,
            dt_s: self.dt_s,
            time: self.time.add_seconds(self.dt_s),
        }
    }
}
