pub mod metadata;
pub mod naming;
pub mod recording_writer;
