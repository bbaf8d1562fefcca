//! Job records, their state machine and the in-memory store.

pub mod progress;
pub mod query;
pub mod record;
pub mod status;
pub mod store;

pub use progress::{JobProgressBroadcaster, JobProgressEvent};
pub use query::{ResultView, StatusSnapshot};
pub use record::{new_job_id, Job, JobResult, META_BLOB_URL, META_DETECTED_LANGUAGE_CODE};
pub use status::JobStatus;
pub use store::JobStore;
