//! Pending-work structures: a FIFO queue for high priority, a LIFO stack for low.
//!
//! Both own copies of the tasks they hold; the pending registry keeps its own
//! copy, so the two containers never alias.

use super::registry::{SEED_CAPACITY, grow_if_full};
use super::task::Task;
use crate::error::{Result, TrackerError};

/// First-in first-out queue for high-priority tasks.
///
/// Dequeue only advances `head`; drained slots stay in storage until the
/// queue is dropped, so capacity grows but is never reclaimed.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    items: Vec<Task>,
    head: usize,
    capacity: usize,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(SEED_CAPACITY),
            head: 0,
            capacity: SEED_CAPACITY,
        }
    }

    pub fn push(&mut self, task: Task) {
        grow_if_full(&mut self.items, &mut self.capacity);
        self.items.push(task);
    }

    /// Returns a copy of the oldest live task and advances `head` past it.
    pub fn pop(&mut self) -> Result<Task> {
        let task = self
            .items
            .get(self.head)
            .cloned()
            .ok_or(TrackerError::EmptyStructure("high-priority queue"))?;
        self.head += 1;
        Ok(task)
    }

    pub fn is_empty(&self) -> bool {
        self.head >= self.items.len()
    }

    /// Number of live (not yet dequeued) tasks.
    pub fn len(&self) -> usize {
        self.items.len() - self.head
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the next task to dequeue.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Index of the most recently enqueued task, `None` before the first push.
    pub fn tail(&self) -> Option<usize> {
        self.items.len().checked_sub(1)
    }

    /// Live tasks, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.items[self.head..].iter()
    }
}

/// Last-in first-out stack for low-priority tasks.
#[derive(Debug, Clone)]
pub struct TaskStack {
    items: Vec<Task>,
    capacity: usize,
}

impl Default for TaskStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStack {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(SEED_CAPACITY),
            capacity: SEED_CAPACITY,
        }
    }

    pub fn push(&mut self, task: Task) {
        grow_if_full(&mut self.items, &mut self.capacity);
        self.items.push(task);
    }

    /// Returns the top task and moves `top` down by one.
    pub fn pop(&mut self) -> Result<Task> {
        self.items
            .pop()
            .ok_or(TrackerError::EmptyStructure("low-priority stack"))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the top element, `None` when empty.
    pub fn top(&self) -> Option<usize> {
        self.items.len().checked_sub(1)
    }

    /// Live tasks, top of the stack first.
    pub fn iter(&self) -> std::iter::Rev<std::slice::Iter<'_, Task>> {
        self.items.iter().rev()
    }
}
