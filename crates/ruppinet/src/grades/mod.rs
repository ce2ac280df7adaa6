//! Grade polling, snapshot diffing, and the background check job.

pub mod job;
pub mod poller;
pub mod snapshot;

pub use job::GradeCheckJob;
pub use poller::{GradePoller, PollReport};
pub use snapshot::GradeSnapshot;
