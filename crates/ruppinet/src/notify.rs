//! Notification sink for grade updates.

use tracing::info;

/// Fire-and-forget notification delivery. Implementations must swallow
/// delivery failures; a denied notification permission must never take the
/// poller down.
pub trait Notifier: Send + Sync {
    /// `slot` distinguishes notifications raised within one poll cycle so a
    /// host can show them side by side instead of replacing one another.
    fn notify(&self, title: &str, message: &str, slot: u32);
}

/// Writes notifications to the log. The agent binary's default sink; a host
/// with a real notification service supplies its own implementation.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str, slot: u32) {
        info!(slot, title, message, "notification");
    }
}
