pub mod app;
pub mod shutdown;

pub use app::{AppMode, Application};
pub use shutdown::{supervise, wait_for_shutdown_signal, ShutdownManager};
