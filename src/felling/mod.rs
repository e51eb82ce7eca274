//! Felling: feasibility, batched removal, yield and durability debit

pub mod tool;
pub mod plan;
pub mod batch;
pub mod stacks;
pub mod executor;

pub use tool::{durability_cost, Budget, Lumberjack, ToolState, ToolWear};
pub use plan::{plan_felling, FellingPlan, Infeasible};
pub use batch::{group_adjacent, RemovalBatch};
pub use stacks::{stack_distribution, yield_stacks, ItemStack};
pub use executor::{BreakTicket, FellingJob, FellingReport, FellingSummary};
