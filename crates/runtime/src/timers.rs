use foundation::time::Time;

/// Cancellation handle for a scheduled timer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Pending<T> {
    id: u64,
    due: Time,
    payload: T,
}

/// Frame-driven one-shot timers.
///
/// Time only moves when the owner calls [`TimerQueue::advance`], so firing is
/// deterministic and a dropped queue never fires anything.
///
/// Ordering contract:
/// - Timers fire in ascending due time.
/// - Timers due at the same time fire in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    now: Time,
    pending: Vec<Pending<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            now: Time::ZERO,
            pending: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedules `payload` to fire `delay_s` seconds from now.
    pub fn schedule_after(&mut self, delay_s: f64, payload: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(Pending {
            id,
            due: self.now.add_seconds(delay_s.max(0.0)),
            payload,
        });
        TimerHandle(id)
    }

    /// Cancels a timer, returning its payload if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let pos = self.pending.iter().position(|p| p.id == handle.0)?;
        Some(self.pending.remove(pos).payload)
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Advances the clock by `dt_s` and returns every payload that came due.
    pub fn advance(&mut self, dt_s: f64) -> Vec<T> {
        self.now = self.now.add_seconds(dt_s.max(0.0));
        let now = self.now;

        let (mut due, keep): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|p| p.due.0 <= now.0);
        self.pending = keep;

        due.sort_by(|a, b| a.due.0.total_cmp(&b.due.0).then_with(|| a.id.cmp(&b.id)));
        due.into_iter().map(|p| p.payload).collect()
    }
}
