//! Transient user-visible notifications
//!
//! Core components report non-fatal events (malformed stream lines,
//! unsupported capabilities, misuse of regenerate) through the [`Notifier`]
//! seam. The UI layer decides how to show them; the bundled
//! [`ChannelNotifier`] forwards notices to a toast queue over a channel.

use tokio::sync::mpsc;

/// Severity of a notice, mapped to toast styling by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
}

/// A transient user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Error,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Info,
        }
    }
}

/// Sink for transient notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that forwards notices over an unbounded channel
///
/// The receiving end is drained by the UI event loop. Dropped receivers are
/// tolerated; a notice nobody listens for is simply discarded.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(Notice::error("bozuk satır"));

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.text, "bozuk satır");
        assert_eq!(notice.kind, NoticeKind::Error);
    }

    #[test]
    fn test_channel_notifier_tolerates_dropped_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify(Notice::info("kimse dinlemiyor"));
    }
}
