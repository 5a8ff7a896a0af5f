pub mod batch;
pub mod job;
pub mod loaders;
pub mod plan;

pub use batch::{dedup_items, split_into_batches, Batch, Batching};
pub use job::{ActiveJob, JobNamer, JobOutcome, JobState, RunLogRow, SubmitResponse, RUN_LOG_HEADER};
pub use loaders::load_seeds;
pub use plan::{extend_plan, job_prefix_for, PlannedBatch};
