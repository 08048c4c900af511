pub mod exchange;
pub mod store;

pub use exchange::{exchange, recent_history, SendOutcome, SendRequest, ERROR_REPLY, HISTORY_WINDOW};
pub use store::{SessionStore, DEFAULT_SESSION_TITLE};
