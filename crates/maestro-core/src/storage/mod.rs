//! Durable state: per-agent session logs.

pub mod session_log;

pub use session_log::SessionLog;
