//! 核心编排层：错误与恢复、任务记录、会话监管、流水线构建与编排

pub mod builder;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod outcome;
pub mod recovery;
pub mod session_supervisor;

pub use builder::{
    build_inventory_from_config, create_backend_from_config, select_backend, wrap_backend,
    PipelineBuilder,
};
pub use error::{PipelineError, RecoveryAction};
pub use history::{RunHistory, RunStats};
pub use orchestrator::{BatchReport, Orchestrator, DEFAULT_FALLBACK_COUNT};
pub use outcome::{ActionHint, TaskOutcome};
pub use recovery::RecoveryEngine;
pub use session_supervisor::SessionSupervisor;
