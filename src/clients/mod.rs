pub mod job_client;

#[cfg(test)]
pub(crate) mod fake;

pub use job_client::{JobClient, JobService};
