//! Structured diagnostics produced while converting.
//!
//! Nothing in the engine fails hard on a single resource: every lossy
//! conversion, dropped field or dangling reference becomes a [`Notification`]
//! that the caller surfaces to the user.

use crate::objects::ObjectRef;
use getset::{CopyGetters, Getters};
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::debug;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    /// Converted, but an NGINX nuance could not be preserved.
    Info,
    /// A requested feature could not be converted and was dropped.
    Warning,
    /// Structurally invalid input; the affected object was skipped.
    Error,
}

#[derive(Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[getset(get_copy = "pub")]
    severity: Severity,

    #[getset(get = "pub")]
    message: String,

    #[getset(get = "pub")]
    source: ObjectRef,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>, source: ObjectRef) -> Self {
        Self {
            severity,
            message: message.into(),
            source,
        }
    }
}

/// Append-only collector handed by `&mut` through the conversion call tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Notifications {
    entries: Vec<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, source: &ObjectRef, message: impl Into<String>) {
        let notification = Notification::new(severity, message, source.clone());
        debug!(
            "{} object.ref={} {}",
            notification.severity,
            notification.source,
            notification.message
        );
        self.entries.push(notification);
    }

    pub fn info(&mut self, source: &ObjectRef, message: impl Into<String>) {
        self.push(Severity::Info, source, message);
    }

    pub fn warning(&mut self, source: &ObjectRef, message: impl Into<String>) {
        self.push(Severity::Warning, source, message);
    }

    pub fn error(&mut self, source: &ObjectRef, message: impl Into<String>) {
        self.push(Severity::Error, source, message);
    }

    pub fn extend(&mut self, other: Notifications) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }

    pub fn of_severity(&self, severity: Severity) -> impl Iterator<Item = &Notification> {
        self.entries.iter().filter(move |n| n.severity == severity)
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.entries.iter().map(|n| n.severity).max()
    }

    pub fn as_slice(&self) -> &[Notification] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Notification> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Notifications {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn source() -> ObjectRef {
        ObjectRef::builder()
            .kind("VirtualServer")
            .namespace(Some("default".to_string()))
            .name("cafe")
            .build()
    }

    #[rstest]
    fn test_notifications_keep_order(source: ObjectRef) {
        let mut notifications = Notifications::new();
        notifications.warning(&source, "first");
        notifications.info(&source, "second");
        notifications.error(&source, "third");

        let messages: Vec<_> = notifications.iter().map(|n| n.message().as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(notifications.count(Severity::Warning), 1);
        assert_eq!(notifications.max_severity(), Some(Severity::Error));
    }

    #[rstest]
    fn test_extend_appends(source: ObjectRef) {
        let mut left = Notifications::new();
        left.info(&source, "a");
        let mut right = Notifications::new();
        right.warning(&source, "b");

        left.extend(right);
        assert_eq!(left.len(), 2);
        assert_eq!(left.as_slice()[1].severity(), Severity::Warning);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert!(Severity::Info < Severity::Error);
    }
}
