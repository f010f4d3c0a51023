pub mod image;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod session_gate;
