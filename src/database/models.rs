pub mod log;
pub mod user;

pub use log::{LogEntry, LogRecord, NewLogEntry};
pub use user::{hash_password, NewUser, Role, User};
