mod workflow;

pub use workflow::{Workflow, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_CONCURRENCY};
