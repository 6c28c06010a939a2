//! User-facing notices (toasts in a UI, log lines on a terminal).

use std::cell::Cell;
use std::rc::Rc;

pub type NoticeId = u64;

pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    /// Show a notice that stays until dismissed.
    fn pending(&self, message: &str) -> NoticeId;
    fn dismiss(&self, id: NoticeId);
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn success(&self, message: &str) {
        (**self).success(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }

    fn pending(&self, message: &str) -> NoticeId {
        (**self).pending(message)
    }

    fn dismiss(&self, id: NoticeId) {
        (**self).dismiss(id)
    }
}

/// Writes notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier {
    next_id: Cell<NoticeId>,
}

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        log::info!("[SPD] {}", message);
    }

    fn error(&self, message: &str) {
        log::error!("[SPD] {}", message);
    }

    fn pending(&self, message: &str) -> NoticeId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        log::info!("[SPD] {} (#{})", message, id);
        id
    }

    fn dismiss(&self, id: NoticeId) {
        log::debug!("[SPD] notice #{} dismissed", id);
    }
}
