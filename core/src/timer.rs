//! Virtual-clock scheduler for delayed state-machine transitions.
//!
//! The host owns real time; the owner pops due tasks with
//! [`Scheduler::pop_due`] and then [`Scheduler::settle`]s the clock. Nothing
//! fires on its own, so `cancel_all` guarantees no pending task ever runs.

#[derive(Debug)]
struct ScheduledTask<T> {
    seq: u64,
    due_ms: u64,
    action: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_seq: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn schedule(&mut self, delay_ms: u64, action: T) {
        self.next_seq += 1;
        self.tasks.push(ScheduledTask {
            seq: self.next_seq,
            due_ms: self.now_ms.saturating_add(delay_ms),
            action,
        });
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    /// Removes and returns the earliest task due at or before `until_ms`,
    /// moving the clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<T> {
        let pos = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due_ms <= until_ms)
            .min_by_key(|(_, task)| (task.due_ms, task.seq))
            .map(|(pos, _)| pos)?;

        let task = self.tasks.remove(pos);
        self.now_ms = self.now_ms.max(task.due_ms);
        Some(task.action)
    }

    /// Moves the clock forward to `until_ms` once every due task was popped.
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}
