//! Notification sinks for engine events.
//!
//! Delivery is fire-and-forget: a notifier never reports failure back to
//! the tracker.

use std::sync::Mutex;

use tracing::{debug, info};

use crate::events::Event;

pub trait Notifier {
    fn notify(&self, event: &Event);
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, event: &Event) {
        (**self).notify(event)
    }
}

/// Writes user-visible events to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &Event) {
        match event.message() {
            Some(message) if event.is_user_visible() => info!(%message, "notification"),
            _ => debug!(?event, "event"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Event>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Drain the received events.
    pub fn take(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn recording_notifier_collects_and_drains() {
        let notifier = RecordingNotifier::new();
        let now = Utc::now();
        notifier.notify(&Event::TimerReset { at: now });
        (&notifier).notify(&Event::StreakUpdated { streak: 2, at: now });

        assert_eq!(notifier.events().len(), 2);
        let taken = notifier.take();
        assert_eq!(taken[0], Event::TimerReset { at: now });
        assert!(notifier.events().is_empty());
    }

    #[test]
    fn log_notifier_accepts_any_event() {
        let now = Utc::now();
        LogNotifier.notify(&Event::LevelUp {
            level: 2,
            max_hp: 110,
            at: now,
        });
        LogNotifier.notify(&Event::TimerReset { at: now });
    }
}
