//! Custom middleware: the session gate and request logging.

mod request_log;
mod session_guard;

pub use request_log::RequestLog;
pub use session_guard::SessionGuard;
