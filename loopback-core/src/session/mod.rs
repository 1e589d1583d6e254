pub mod capture_source;
pub mod recording;
