//! Tree discovery: incremental flood fill over log voxels

pub mod trunk;
pub mod result;
pub mod job;

pub use trunk::{Trunk, TrunkProfile, TrunkSize};
pub use result::DiscoveryResult;
pub use job::{DiscoveryJob, DiscoveryOptions, DiscoveryOutcome, DiscoveryState, DiscoveryTicket};
