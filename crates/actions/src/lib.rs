//! Action executors: batch delete, manual import, upgrade search, and
//! hardlink repair, plus the fuzzy torrent scorer they share and the
//! prompt/render seam that keeps them unit-testable without a terminal.

pub mod delete;
pub mod hardlink_repair;
pub mod import;
pub mod io;
pub mod scorer;
pub mod upgrade;

pub use delete::{BatchDeleteExecutor, BatchDeleteOptions, BatchDeleteOutcome};
pub use hardlink_repair::{HardlinkDecision, HardlinkRepairExecutor, HardlinkRepairOutcome};
pub use import::{ManualImportExecutor, ManualImportOptions, ManualImportOutcome};
pub use io::{Formatter, Plan, Prompter, Silent};
pub use scorer::{score_candidate, score_candidates};
pub use upgrade::{MatchMode, UpgradeCandidate, UpgradeSearchExecutor, UpgradeSearchOptions, UpgradeSearchOutcome};
