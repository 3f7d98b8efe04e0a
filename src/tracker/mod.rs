mod dispatch;
mod engine;
mod registry;
mod task;

pub use dispatch::{TaskQueue, TaskStack};
#[cfg(test)]
pub use engine::ScriptedOutcomes;
pub use engine::{Execution, ExecutionEngine, OutcomeSource, RandomOutcomes, Stage, Verdict, Workload};
pub use registry::{IdPolicy, SEED_CAPACITY, TaskRegistry};
pub use task::{
    DESCRIPTION_SLOT, Description, DescriptionPolicy, MAX_DESCRIPTION_LEN, Outcome, Priority, Task,
    create_task,
};
