//! Cancellable scheduled tasks on a virtual millisecond clock.
//!
//! Everything runs on one thread; the host pops due tasks and routes each
//! [`TaskId`] to the component holding its [`TaskHandle`]. A handle cancels
//! its task when dropped, so a component's timers never outlive it.

use log::trace;
use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

#[derive(Debug)]
struct Task {
    due_ms: u64,
    period_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct Queue {
    now_ms: u64,
    next_id: u64,
    tasks: BTreeMap<TaskId, Task>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<Queue>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    /// Moves the clock forward. Never moves it back.
    pub fn advance_to(&self, t_ms: u64) {
        let mut q = self.inner.borrow_mut();
        q.now_ms = q.now_ms.max(t_ms);
    }

    pub fn set_timeout(&self, delay: Duration) -> TaskHandle {
        self.schedule(delay, None)
    }

    pub fn set_interval(&self, period: Duration) -> TaskHandle {
        // zero-period intervals would spin the loop forever
        let period_ms = millis(period).max(1);
        self.schedule(Duration::from_millis(period_ms), Some(period_ms))
    }

    fn schedule(&self, delay: Duration, period_ms: Option<u64>) -> TaskHandle {
        let mut q = self.inner.borrow_mut();
        q.next_id += 1;
        let id = TaskId(q.next_id);
        let due_ms = q.now_ms.saturating_add(millis(delay));
        q.tasks.insert(id, Task { due_ms, period_ms });
        trace!("scheduled {id} due at {due_ms}ms (period {period_ms:?})");
        TaskHandle {
            id,
            scheduler: self.clone(),
        }
    }

    pub fn cancel(&self, id: TaskId) -> bool {
        let removed = self.inner.borrow_mut().tasks.remove(&id).is_some();
        if removed {
            trace!("cancelled {id}");
        }
        removed
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.inner.borrow().tasks.contains_key(&id)
    }

    /// Number of tasks still scheduled. Non-zero after every owner is gone means a leak.
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.inner.borrow().tasks.values().map(|t| t.due_ms).min()
    }

    /// Pops the earliest task due at or before `until_ms`, advancing the clock to
    /// its due time. Repeating tasks are re-armed one period later.
    pub fn pop_due(&self, until_ms: u64) -> Option<TaskId> {
        let mut q = self.inner.borrow_mut();
        let (id, due_ms) = q
            .tasks
            .iter()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by_key(|(id, t)| (t.due_ms, **id))
            .map(|(id, t)| (*id, t.due_ms))?;

        q.now_ms = q.now_ms.max(due_ms);
        let rearm = q.tasks.get(&id).and_then(|t| t.period_ms);
        match rearm {
            Some(period) => {
                if let Some(t) = q.tasks.get_mut(&id) {
                    t.due_ms = due_ms.saturating_add(period);
                }
            }
            None => {
                q.tasks.remove(&id);
            }
        }
        Some(id)
    }
}

/// Owning handle of a scheduled task; dropping it cancels the task.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    scheduler: Scheduler,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is(&self, id: TaskId) -> bool {
        self.id == id
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.scheduler.cancel(self.id);
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_fires_once_at_due_time() {
        let s = Scheduler::new();
        let h = s.set_timeout(Duration::from_millis(50));
        assert_eq!(s.pop_due(49), None);
        assert_eq!(s.pop_due(100), Some(h.id()));
        assert_eq!(s.now_ms(), 50);
        assert_eq!(s.pop_due(1_000), None);
        assert!(!s.is_pending(h.id()));
    }

    #[test]
    fn interval_rearms_until_dropped() {
        let s = Scheduler::new();
        let h = s.set_interval(Duration::from_millis(200));
        assert_eq!(s.pop_due(1_000), Some(h.id()));
        assert_eq!(s.now_ms(), 200);
        assert_eq!(s.pop_due(1_000), Some(h.id()));
        assert_eq!(s.now_ms(), 400);
        drop(h);
        assert_eq!(s.pop_due(1_000), None);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn due_tasks_pop_in_time_then_id_order() {
        let s = Scheduler::new();
        let late = s.set_timeout(Duration::from_millis(30));
        let a = s.set_timeout(Duration::from_millis(10));
        let b = s.set_timeout(Duration::from_millis(10));
        assert_eq!(s.pop_due(100), Some(a.id()));
        assert_eq!(s.pop_due(100), Some(b.id()));
        assert_eq!(s.pop_due(100), Some(late.id()));
    }

    #[test]
    fn replacing_a_handle_cancels_the_old_task() {
        let s = Scheduler::new();
        let mut slot = Some(s.set_timeout(Duration::from_millis(10)));
        let first = slot.as_ref().map(TaskHandle::id).unwrap();
        slot = Some(s.set_timeout(Duration::from_millis(20)));
        assert!(!s.is_pending(first));
        assert_eq!(s.pending(), 1);
        drop(slot);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn clock_never_moves_backwards() {
        let s = Scheduler::new();
        s.advance_to(100);
        s.advance_to(40);
        assert_eq!(s.now_ms(), 100);
        let h = s.set_timeout(Duration::from_millis(5));
        assert_eq!(s.next_due_ms(), Some(105));
        drop(h);
    }

    #[test]
    fn huge_delays_saturate_instead_of_overflowing() {
        let s = Scheduler::new();
        s.advance_to(10);
        let far = s.set_timeout(Duration::from_millis(u64::MAX));
        assert_eq!(s.next_due_ms(), Some(u64::MAX));
        assert_eq!(s.pop_due(1_000), None);
        assert!(s.is_pending(far.id()));
    }
}
