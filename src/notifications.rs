//! Notification outbox for downstream dispatchers.
//!
//! The engine reports point awards, badge unlocks, and level-ups through a
//! channel; delivery (push, email, feed) is handled by an external consumer.
//! Sending never fails the calling operation.

use crossbeam::channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use uuid::Uuid;

/// An event another subsystem may want to surface to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Points were credited to a user's balance.
    PointsAwarded {
        user_id: Uuid,
        amount: i64,
        reason: String,
    },
    /// A badge was unlocked for a user.
    BadgeUnlocked {
        user_id: Uuid,
        badge_id: String,
        name: String,
        emoji: String,
        points_reward: i64,
    },
    /// A user reached a new numeric level.
    LevelUp { user_id: Uuid, level: u32 },
}

/// Handle for pushing notifications into the outbox.
#[derive(Clone)]
pub struct Notifier {
    tx: Option<Sender<Notification>>,
}

impl Notifier {
    /// Create a notifier and the receiving end for the dispatcher.
    pub fn channel() -> (Self, Receiver<Notification>) {
        let (tx, rx) = unbounded();
        (Self { tx: Some(tx) }, rx)
    }

    /// Create a notifier that silently discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Push a notification. Disconnected receivers are tolerated.
    pub fn notify(&self, notification: Notification) {
        if let Some(tx) = &self.tx {
            if tx.send(notification).is_err() {
                tracing::debug!("notification dropped: receiver disconnected");
            }
        }
    }
}
