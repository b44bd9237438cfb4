pub mod jobs;

pub use jobs::job_routes;
