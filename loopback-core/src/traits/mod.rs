pub mod capture_backend;
pub mod completion_cue;
pub mod recorder;
pub mod session_delegate;
