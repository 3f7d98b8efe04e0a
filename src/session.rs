use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::codec;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::report;
use crate::tracker::{
    DescriptionPolicy, Execution, ExecutionEngine, IdPolicy, OutcomeSource, Priority,
    RandomOutcomes, Task, TaskQueue, TaskRegistry, TaskStack, Workload, create_task,
};

/// Which collection a task was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Pending,
    Succeeded,
    Failed,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Pending => write!(f, "pending"),
            Collection::Succeeded => write!(f, "succeeded"),
            Collection::Failed => write!(f, "failed"),
        }
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located<'a> {
    pub task: &'a Task,
    pub collection: Collection,
}

/// Read-only view over both completed registries.
#[derive(Debug, Clone, Copy)]
pub struct CompletedView<'a> {
    pub succeeded: &'a [Task],
    pub failed: &'a [Task],
}

/// One tracking session: every registry, both dispatch structures and the engine.
///
/// This is the whole command surface the shell drives. It never prints.
pub struct TaskTracker<O = RandomOutcomes> {
    pending: TaskRegistry,
    high: TaskQueue,
    low: TaskStack,
    succeeded: TaskRegistry,
    failed: TaskRegistry,
    engine: ExecutionEngine<O>,
    id_policy: IdPolicy,
    description_policy: DescriptionPolicy,
}

impl TaskTracker<RandomOutcomes> {
    /// Builds a session whose random source and policies come from `config`.
    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        let outcomes = RandomOutcomes::new(config.seed, config.success_probability)?;
        Ok(Self::new(outcomes).with_policies(config.id_policy, config.long_descriptions))
    }
}

impl<O: OutcomeSource> TaskTracker<O> {
    pub fn new(outcomes: O) -> Self {
        Self {
            pending: TaskRegistry::new(),
            high: TaskQueue::new(),
            low: TaskStack::new(),
            succeeded: TaskRegistry::new(),
            failed: TaskRegistry::new(),
            engine: ExecutionEngine::new(outcomes),
            id_policy: IdPolicy::default(),
            description_policy: DescriptionPolicy::default(),
        }
    }

    pub fn with_policies(mut self, ids: IdPolicy, descriptions: DescriptionPolicy) -> Self {
        self.id_policy = ids;
        self.description_policy = descriptions;
        self
    }

    /// Registers a new pending task and publishes it to the structure its
    /// priority selects.
    pub fn intake(&mut self, description: &str, priority: Priority) -> Result<Task> {
        let id = self.pending.next_id(self.id_policy);
        let task = create_task(id, description, priority, self.description_policy)?;
        self.pending.append(task.clone());
        match priority {
            Priority::High => self.high.push(task.clone()),
            Priority::Low => self.low.push(task.clone()),
        }
        info!(id, %priority, "task registered");
        Ok(task)
    }

    /// Executes exactly one pending task, or reports that none is waiting.
    pub fn execute_next(&mut self) -> Result<Execution> {
        let execution = self.engine.execute_next(Workload {
            high: &mut self.high,
            low: &mut self.low,
            succeeded: &mut self.succeeded,
            failed: &mut self.failed,
        })?;
        if let Execution::Processed(task) = &execution {
            if self.pending.take(task).is_none() {
                warn!(id = task.id, "executed task was missing from the pending registry");
            }
        }
        Ok(execution)
    }

    /// Pending tasks in intake order.
    pub fn list_pending(&self) -> &[Task] {
        self.pending.as_slice()
    }

    pub fn list_completed(&self) -> CompletedView<'_> {
        CompletedView {
            succeeded: self.succeeded.as_slice(),
            failed: self.failed.as_slice(),
        }
    }

    /// Looks `id` up in pending, then succeeded, then failed.
    pub fn find(&self, id: u32) -> Result<Located<'_>> {
        let searches = [
            (&self.pending, Collection::Pending),
            (&self.succeeded, Collection::Succeeded),
            (&self.failed, Collection::Failed),
        ];
        searches
            .into_iter()
            .find_map(|(registry, collection)| {
                registry
                    .find_by_id(id)
                    .ok()
                    .map(|task| Located { task, collection })
            })
            .ok_or(TrackerError::NotFound(id))
    }

    /// Writes the succeeded-task report, returning the number of tasks listed.
    pub fn generate_report(&self, path: &Path) -> Result<usize> {
        report::write_success_report(path, self.succeeded.as_slice())
    }

    /// Persists both completed registries. Pending work is not saved.
    pub fn save(&self, path: &Path) -> Result<()> {
        if !self.pending.is_empty() {
            info!(
                pending = self.pending.len(),
                "pending tasks are not persisted"
            );
        }
        codec::save(&self.succeeded, &self.failed, path)
    }

    /// Replaces both completed registries with the contents of `path`.
    /// On error the session is left unchanged.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let set = codec::load(path)?;
        self.succeeded = set.succeeded;
        self.failed = set.failed;
        Ok(())
    }

    pub fn high_queue(&self) -> &TaskQueue {
        &self.high
    }

    pub fn low_stack(&self) -> &TaskStack {
        &self.low
    }

    #[cfg(test)]
    pub fn succeeded(&self) -> &TaskRegistry {
        &self.succeeded
    }

    #[cfg(test)]
    pub fn failed(&self) -> &TaskRegistry {
        &self.failed
    }
}
