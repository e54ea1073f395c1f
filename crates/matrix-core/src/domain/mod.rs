//! Domain types shared by the store, memory engine, indexer, and scheduler.

pub mod code;
pub mod execution;
pub mod failure;
pub mod ids;
pub mod repo;
pub mod solution;
pub mod task;
pub mod usage_log;
pub mod warning;

pub use code::{Import, RepoFile, Symbol, SymbolKind};
pub use execution::{Execution, ExecutionStatus, TriggeredBy};
pub use failure::{ErrorType, Failure, NewFailure};
pub use repo::Repo;
pub use solution::{Category, NewSolution, Scope, Solution};
pub use task::{NewTask, Task, WorktreeOptions};
pub use usage_log::{Outcome, UsageLog};
pub use warning::{Severity, Warning, WarningType};
