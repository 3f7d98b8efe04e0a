use std::fmt;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::dispatch::{TaskQueue, TaskStack};
use super::registry::TaskRegistry;
use super::task::{Outcome, Task};
use crate::error::{Result, TrackerError};

/// The four stages of a single execution cycle.
///
/// Each cycle flows through: SELECT → SIMULATE → CLASSIFY → FILE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Select,
    Simulate,
    Classify,
    File,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Select => write!(f, "SELECT"),
            Stage::Simulate => write!(f, "SIMULATE"),
            Stage::Classify => write!(f, "CLASSIFY"),
            Stage::File => write!(f, "FILE"),
        }
    }
}

/// Terminal result chosen for an executed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Succeeded,
    Failed,
}

impl From<Verdict> for Outcome {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Succeeded => Outcome::Succeeded,
            Verdict::Failed => Outcome::Failed,
        }
    }
}

/// Decides how a task's simulated execution ends.
pub trait OutcomeSource {
    fn decide(&mut self, task: &Task) -> Verdict;
}

/// Coin-flip outcomes from an owned, seedable random source.
#[derive(Debug, Clone)]
pub struct RandomOutcomes {
    rng: StdRng,
    success_probability: f64,
}

impl RandomOutcomes {
    /// `success_probability` must lie in `[0, 1]`.
    pub fn new(seed: Option<u64>, success_probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&success_probability) {
            return Err(TrackerError::Config(format!(
                "success probability {success_probability} is outside [0, 1]"
            )));
        }
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            success_probability,
        })
    }
}

impl Default for RandomOutcomes {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            success_probability: 0.5,
        }
    }
}

impl OutcomeSource for RandomOutcomes {
    fn decide(&mut self, _task: &Task) -> Verdict {
        if self.rng.gen_bool(self.success_probability) {
            Verdict::Succeeded
        } else {
            Verdict::Failed
        }
    }
}

/// Replays a fixed list of verdicts, then repeats the last one.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ScriptedOutcomes {
    script: std::collections::VecDeque<Verdict>,
    last: Verdict,
}

#[cfg(test)]
impl ScriptedOutcomes {
    pub fn new(script: impl IntoIterator<Item = Verdict>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: Verdict::Succeeded,
        }
    }

    pub fn always(verdict: Verdict) -> Self {
        Self {
            script: Default::default(),
            last: verdict,
        }
    }
}

#[cfg(test)]
impl OutcomeSource for ScriptedOutcomes {
    fn decide(&mut self, _task: &Task) -> Verdict {
        if let Some(v) = self.script.pop_front() {
            self.last = v;
        }
        self.last
    }
}

/// Mutable view of everything one execution cycle touches.
pub struct Workload<'a> {
    pub high: &'a mut TaskQueue,
    pub low: &'a mut TaskStack,
    pub succeeded: &'a mut TaskRegistry,
    pub failed: &'a mut TaskRegistry,
}

/// Result of one execution cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// A task was dispatched and filed; carries its final state.
    Processed(Task),
    /// Both dispatch structures were empty; nothing changed.
    Idle,
}

/// Drives one pending task per call through the execution stages.
pub struct ExecutionEngine<O> {
    outcomes: O,
}

impl<O: OutcomeSource> ExecutionEngine<O> {
    pub fn new(outcomes: O) -> Self {
        Self { outcomes }
    }

    /// Runs a full SELECT → SIMULATE → CLASSIFY → FILE cycle.
    ///
    /// High-priority work is always selected before low-priority work. With
    /// both structures empty this returns [`Execution::Idle`] untouched.
    pub fn execute_next(&mut self, work: Workload<'_>) -> Result<Execution> {
        debug!(stage = %Stage::Select, "selecting next task");
        let mut task = if !work.high.is_empty() {
            work.high.pop()?
        } else if !work.low.is_empty() {
            work.low.pop()?
        } else {
            debug!("no pending tasks to process");
            return Ok(Execution::Idle);
        };

        debug!(stage = %Stage::Simulate, id = task.id, "simulating execution");
        let verdict = self.outcomes.decide(&task);
        task.complete(verdict.into(), Utc::now());

        debug!(stage = %Stage::Classify, id = task.id, outcome = %task.outcome, "classified");
        let target = match verdict {
            Verdict::Succeeded => work.succeeded,
            Verdict::Failed => work.failed,
        };

        debug!(stage = %Stage::File, id = task.id, "filing completed task");
        target.append(task.clone());

        info!(
            id = task.id,
            priority = %task.priority,
            outcome = %task.outcome,
            "task executed"
        );
        Ok(Execution::Processed(task))
    }
}
