use serde::{Deserialize, Serialize};

use super::task::Task;
use crate::error::{Result, TrackerError};

/// Capacity every growable structure starts from on its first growth.
pub const SEED_CAPACITY: usize = 10;

/// Growth policy shared by the registry and both dispatch structures:
/// seed at [`SEED_CAPACITY`], then double.
pub(crate) fn grown_capacity(current: usize) -> usize {
    if current == 0 {
        SEED_CAPACITY
    } else {
        current * 2
    }
}

/// Reserves exactly up to `capacity` slots when `items` is full, doubling it.
pub(crate) fn grow_if_full<T>(items: &mut Vec<T>, capacity: &mut usize) {
    if items.len() >= *capacity {
        *capacity = grown_capacity(*capacity);
        items.reserve_exact(*capacity - items.len());
    }
}

/// How ids are handed out at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdPolicy {
    /// `pending_count + 1`. Ids can repeat once earlier tasks have been executed.
    #[default]
    PendingLength,
    /// Counter owned by the registry, never reused within a session.
    Monotonic,
}

/// Ordered, auto-resizing collection of tasks.
///
/// `capacity` is tracked explicitly so growth follows the seed-then-double
/// policy regardless of what the allocator hands back.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    capacity: usize,
    issued: u32,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry with no slack: `capacity == len`.
    pub fn with_exact_capacity(tasks: Vec<Task>) -> Self {
        let capacity = tasks.len();
        let issued = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        Self {
            tasks,
            capacity,
            issued,
        }
    }

    /// Appends a task, doubling capacity when full. Amortized O(1).
    pub fn append(&mut self, task: Task) {
        grow_if_full(&mut self.tasks, &mut self.capacity);
        self.issued = self.issued.max(task.id);
        self.tasks.push(task);
    }

    /// Linear scan returning the first task with `id`.
    pub fn find_by_id(&self, id: u32) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(TrackerError::NotFound(id))
    }

    /// Removes and returns the first entry from the same intake as `task`.
    /// Capacity is kept.
    pub fn take(&mut self, task: &Task) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.same_intake(task))?;
        Some(self.tasks.remove(pos))
    }

    /// Id the next intake should receive under `policy`.
    pub fn next_id(&self, policy: IdPolicy) -> u32 {
        match policy {
            IdPolicy::PendingLength => self.tasks.len() as u32 + 1,
            IdPolicy::Monotonic => self.issued + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }
}

impl<'a> IntoIterator for &'a TaskRegistry {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::task::{Description, Priority};

    fn task(id: u32) -> Task {
        Task::new(
            id,
            Description::new(&format!("task {id}")).unwrap(),
            Priority::High,
        )
    }

    #[test]
    fn growth_keeps_every_element() {
        for n in [0u32, 1, 10, 11, 100] {
            let mut reg = TaskRegistry::new();
            for id in 1..=n {
                reg.append(task(id));
            }
            assert_eq!(reg.len(), n as usize);
            assert!(reg.len() <= reg.capacity());
            let ids: Vec<u32> = reg.iter().map(|t| t.id).collect();
            assert_eq!(ids, (1..=n).collect::<Vec<_>>());
            for id in 1..=n {
                assert_eq!(reg.find_by_id(id).unwrap().description.as_str(), format!("task {id}"));
            }
        }
    }

    #[test]
    fn capacity_seeds_then_doubles() {
        let mut reg = TaskRegistry::new();
        assert_eq!(reg.capacity(), 0);
        reg.append(task(1));
        assert_eq!(reg.capacity(), 10);
        for id in 2..=10 {
            reg.append(task(id));
        }
        assert_eq!(reg.capacity(), 10);
        reg.append(task(11));
        assert_eq!(reg.capacity(), 20);
        for id in 12..=21 {
            reg.append(task(id));
        }
        assert_eq!(reg.capacity(), 40);
    }

    #[test]
    fn find_returns_first_match() {
        let mut reg = TaskRegistry::new();
        let first = task(2);
        let mut second = task(2);
        second.description = Description::new("duplicate").unwrap();
        reg.append(first.clone());
        reg.append(second);
        assert_eq!(reg.find_by_id(2).unwrap(), &first);
    }

    #[test]
    fn find_missing_is_not_found() {
        let reg = TaskRegistry::new();
        assert!(matches!(reg.find_by_id(9), Err(TrackerError::NotFound(9))));
    }

    #[test]
    fn take_removes_only_the_matching_entry() {
        let mut reg = TaskRegistry::new();
        let a = task(1);
        let b = task(2);
        reg.append(a.clone());
        reg.append(b.clone());
        assert_eq!(reg.take(&a), Some(a.clone()));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.capacity(), 10);
        assert_eq!(reg.take(&a), None);
        assert_eq!(reg.as_slice(), &[b]);
    }

    #[test]
    fn exact_capacity_has_no_slack() {
        let reg = TaskRegistry::with_exact_capacity(vec![task(1), task(2), task(3)]);
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.capacity(), 3);

        let empty = TaskRegistry::with_exact_capacity(Vec::new());
        assert_eq!(empty.capacity(), 0);
    }

    #[test]
    fn pending_length_ids_repeat_after_removal() {
        let mut reg = TaskRegistry::new();
        let a = task(reg.next_id(IdPolicy::PendingLength));
        reg.append(a.clone());
        reg.append(task(reg.next_id(IdPolicy::PendingLength)));
        reg.take(&a);
        // Only task 2 remains, so the next id collides with it.
        assert_eq!(reg.next_id(IdPolicy::PendingLength), 2);
    }

    #[test]
    fn monotonic_ids_never_repeat() {
        let mut reg = TaskRegistry::new();
        let a = task(reg.next_id(IdPolicy::Monotonic));
        reg.append(a.clone());
        reg.append(task(reg.next_id(IdPolicy::Monotonic)));
        reg.take(&a);
        assert_eq!(reg.next_id(IdPolicy::Monotonic), 3);
    }

    #[test]
    fn id_policy_deserializes_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: IdPolicy,
        }
        let w: Wrapper = toml::from_str(r#"policy = "pending-length""#).unwrap();
        assert_eq!(w.policy, IdPolicy::PendingLength);
        let w: Wrapper = toml::from_str(r#"policy = "monotonic""#).unwrap();
        assert_eq!(w.policy, IdPolicy::Monotonic);
    }
}
