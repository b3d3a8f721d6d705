//! Application use cases: the Job Runner envelope, the four-stage Pipeline,
//! and the standalone Orphan Reconciler, Task Submission, and Delete Repo
//! services.

pub mod chunker;
pub mod delete_repo;
pub mod job_runner;
pub mod orphan_reconciler;
pub mod pipeline;
pub mod stages;
pub mod task_submission;
pub mod wiki_generator;
