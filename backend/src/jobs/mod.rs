pub mod extractor;
pub mod status;
pub mod store;
pub mod tracker;
pub mod worker;

pub use extractor::{HttpExtractionClient, TextExtractor};
pub use status::JobStatus;
pub use store::StatusStore;
pub use tracker::{JobTracker, QueueTracker, StoreTracker, TieredTracker, queue_state_label};
pub use worker::Worker;
