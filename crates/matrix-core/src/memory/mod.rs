//! The memory engine: recall, store, reward, the failure engine, and
//! warnings (§4.3–§4.5, §4.7).

pub mod failures;
pub mod listing;
pub mod recall;
pub mod reward;
pub mod store_solution;
pub mod warnings;

pub use failures::{record_failure, search_failures, FailureMatch};
pub use listing::{list_failures, list_repos, list_solutions, FailureSummary, RepoSummary, SolutionSummary};
pub use recall::{recall, BoostTag, RecallQuery, RecallResult};
pub use reward::{reward, RewardOutcome};
pub use store_solution::store_solution;
pub use warnings::{
    add as add_warning, check as check_warning, list as list_warnings, remove as remove_warning,
    NewWarning,
};
