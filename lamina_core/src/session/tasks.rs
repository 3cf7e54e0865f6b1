// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback tasks and the idle/commit queues.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use super::Session;

/// A deferred callback run from the idle or commit phase.
pub type TaskFn = Box<dyn FnMut(&mut Session)>;

/// A handle to a callback task registered with
/// [`Session::create_task`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    idx: u32,
    generation: u32,
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({}@gen{})", self.idx, self.generation)
    }
}

/// Slot storage for task callbacks.
pub(crate) struct TaskRegistry {
    callbacks: Vec<Option<TaskFn>>,
    generation: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    len: u32,
}

impl TaskRegistry {
    pub(crate) const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn create(&mut self, callback: TaskFn) -> TaskId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.callbacks[idx as usize] = Some(callback);
            self.alive[idx as usize] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.callbacks.push(Some(callback));
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        TaskId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn is_alive(&self, id: TaskId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    fn validate(&self, id: TaskId) {
        assert!(self.is_alive(id), "stale TaskId: {id:?}");
    }

    fn destroy(&mut self, id: TaskId) {
        let i = id.idx as usize;
        self.callbacks[i] = None;
        self.alive[i] = false;
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.free_list.push(id.idx);
    }

    /// Moves a callback out for running, with the generation it belongs to.
    fn take(&mut self, idx: u32) -> Option<(TaskFn, u32)> {
        let i = idx as usize;
        if !self.alive[i] {
            return None;
        }
        let callback = self.callbacks[i].take()?;
        Some((callback, self.generation[i]))
    }

    /// Puts a callback back unless its task was destroyed while running.
    fn restore(&mut self, idx: u32, generation: u32, callback: TaskFn) {
        let i = idx as usize;
        if self.alive[i] && self.generation[i] == generation && self.callbacks[i].is_none() {
            self.callbacks[i] = Some(callback);
        }
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("slots", &self.callbacks.len())
            .field("free", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Registers a callback task. It does nothing until scheduled.
    pub fn create_task(&mut self, task: impl FnMut(&mut Self) + 'static) -> TaskId {
        self.tasks.create(Box::new(task))
    }

    /// Appends the task to the idle queue unless it is already queued there.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn schedule_idle(&mut self, id: TaskId) {
        self.tasks.validate(id);
        if !self.idle.is_linked(id.idx) {
            self.idle.push_back(id.idx);
        }
    }

    /// Appends the task to the commit queue unless it is already queued there.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn schedule_commit(&mut self, id: TaskId) {
        self.tasks.validate(id);
        if !self.commit.is_linked(id.idx) {
            self.commit.push_back(id.idx);
        }
    }

    /// Returns whether the task waits in the idle or the commit queue.
    #[must_use]
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.is_alive(id) && (self.idle.is_linked(id.idx) || self.commit.is_linked(id.idx))
    }

    /// Unlinks the task from both queues.
    pub fn cancel_task(&mut self, id: TaskId) {
        self.tasks.validate(id);
        self.idle.remove(id.idx);
        self.commit.remove(id.idx);
    }

    /// Cancels and frees a task. A task may destroy itself while running.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or names one of the session's own tasks.
    pub fn destroy_task(&mut self, id: TaskId) {
        assert!(
            id != self.redraw_task && id != self.commit_task,
            "cannot destroy a built-in task"
        );
        self.cancel_task(id);
        self.tasks.destroy(id);
    }

    /// Drains the idle queue, including tasks queued while draining. Returns the
    /// number of callbacks run.
    pub fn run_idle_tasks(&mut self) -> u32 {
        let mut ran = 0;
        while let Some(idx) = self.idle.pop_front() {
            if self.run_task(idx) {
                ran += 1;
            }
        }
        self.stats.idle_tasks += ran;
        ran
    }

    /// Applies dropped surface holders, then drains the commit queue, including
    /// tasks queued while draining. Returns the number of callbacks run.
    pub fn run_commit_tasks(&mut self) -> u32 {
        self.release_dropped_surfaces();
        let mut ran = 0;
        while let Some(idx) = self.commit.pop_front() {
            if self.run_task(idx) {
                ran += 1;
            }
        }
        self.stats.commit_tasks += ran;
        ran
    }

    fn run_task(&mut self, idx: u32) -> bool {
        let Some((mut callback, generation)) = self.tasks.take(idx) else {
            return false;
        };
        callback(self);
        self.tasks.restore(idx, generation, callback);
        true
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::protocol::NullProtocol;
    use crate::session::Session;

    #[test]
    fn idle_runs_in_fifo_order_and_once() {
        let mut session = Session::new(NullProtocol);
        let log = Rc::new(RefCell::new(Vec::new()));
        let ids: Vec<_> = (0..3)
            .map(|n| {
                let log = log.clone();
                session.create_task(move |_| log.borrow_mut().push(n))
            })
            .collect();
        session.schedule_idle(ids[2]);
        session.schedule_idle(ids[0]);
        session.schedule_idle(ids[2]);
        session.schedule_idle(ids[1]);

        assert_eq!(session.run_idle_tasks(), 3);
        assert_eq!(*log.borrow(), vec![2, 0, 1]);
        assert_eq!(session.run_idle_tasks(), 0);
    }

    #[test]
    fn task_may_reschedule_itself_within_a_drain() {
        let mut session = Session::new(NullProtocol);
        let count = Rc::new(RefCell::new(0));
        let seen = count.clone();
        let slot = Rc::new(RefCell::new(None));
        let me = slot.clone();
        let id = session.create_task(move |s| {
            *seen.borrow_mut() += 1;
            if *seen.borrow() < 3 {
                if let Some(id) = *me.borrow() {
                    s.schedule_idle(id);
                }
            }
        });
        *slot.borrow_mut() = Some(id);
        session.schedule_idle(id);
        assert_eq!(session.run_idle_tasks(), 3);
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn cancel_and_destroy() {
        let mut session = Session::new(NullProtocol);
        let hits = Rc::new(RefCell::new(0));
        let seen = hits.clone();
        let id = session.create_task(move |_| *seen.borrow_mut() += 1);
        session.schedule_idle(id);
        session.schedule_commit(id);
        assert!(session.is_scheduled(id));
        session.cancel_task(id);
        assert!(!session.is_scheduled(id));
        assert_eq!(session.run_idle_tasks() + session.run_commit_tasks(), 0);

        session.schedule_commit(id);
        assert_eq!(session.run_commit_tasks(), 1);
        session.destroy_task(id);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    #[should_panic(expected = "stale TaskId")]
    fn destroyed_task_cannot_be_scheduled() {
        let mut session = Session::new(NullProtocol);
        let id = session.create_task(|_| {});
        session.destroy_task(id);
        session.schedule_idle(id);
    }

    #[test]
    fn task_destroying_itself_is_not_restored() {
        let mut session = Session::new(NullProtocol);
        let slot = Rc::new(RefCell::new(None));
        let me = slot.clone();
        let id = session.create_task(move |s| {
            if let Some(id) = me.borrow_mut().take() {
                s.destroy_task(id);
            }
        });
        *slot.borrow_mut() = Some(id);
        session.schedule_idle(id);
        assert_eq!(session.run_idle_tasks(), 1);
        let reused = session.create_task(|_| {});
        assert_ne!(reused, id);
    }
}
