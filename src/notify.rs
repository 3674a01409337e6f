//! User feedback sink.
//!
//! The session reports every edit outcome here. Hosts plug in whatever shows
//! messages to the user; the default drops them.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Success,
    Info,
    Warning,
    Error,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Success => "success",
            Feedback::Info => "info",
            Feedback::Warning => "warning",
            Feedback::Error => "error",
        }
    }
}

pub trait Notifier {
    fn notify(&self, level: Feedback, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _level: Feedback, _message: &str) {}
}

/// Writes feedback to the console log
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Feedback, message: &str) {
        match level {
            Feedback::Success | Feedback::Info => crate::console_log!("[{}] {}", level.as_str(), message),
            Feedback::Warning => crate::console_warn!("[{}] {}", level.as_str(), message),
            Feedback::Error => crate::console_error!("[{}] {}", level.as_str(), message),
        }
    }
}

/// Holds messages until the host drains them.
///
/// Lets a host deliver feedback after it has released its own state, so a
/// handler that reads that state back does not run while it is borrowed.
#[derive(Debug, Default)]
pub struct FeedbackQueue {
    pending: RefCell<Vec<(Feedback, String)>>,
}

impl FeedbackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued message, oldest first
    pub fn drain(&self) -> Vec<(Feedback, String)> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }
}

impl Notifier for FeedbackQueue {
    fn notify(&self, level: Feedback, message: &str) {
        self.pending.borrow_mut().push((level, message.to_string()));
    }
}

impl<N: Notifier + ?Sized> Notifier for std::rc::Rc<N> {
    fn notify(&self, level: Feedback, message: &str) {
        (**self).notify(level, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drains_in_order_and_empties() {
        let queue = FeedbackQueue::new();
        queue.notify(Feedback::Success, "Scope added");
        queue.notify(Feedback::Warning, "overlap");

        assert_eq!(
            queue.drain(),
            vec![
                (Feedback::Success, "Scope added".to_string()),
                (Feedback::Warning, "overlap".to_string()),
            ]
        );
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_queue_accepts_messages_while_draining() {
        let queue = FeedbackQueue::new();
        queue.notify(Feedback::Info, "first");
        for (level, _) in queue.drain() {
            queue.notify(level, "from handler");
        }
        assert_eq!(queue.drain(), vec![(Feedback::Info, "from handler".to_string())]);
    }
}
