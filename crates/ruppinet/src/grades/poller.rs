//! One grade-poll cycle: fetch, diff against the stored snapshot, notify,
//! persist.

use crate::client::GradesSource;
use crate::error::PortalError;
use crate::grades::snapshot::GradeSnapshot;
use crate::notify::Notifier;
use crate::storage::{keys, KeyValueStore};
use std::sync::Arc;
use tracing::{debug, info};

/// What a successful poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    /// Pairs present now that were not in the stored snapshot
    pub new_entries: usize,
    /// Notifications emitted
    pub notified: usize,
    /// Whether the stored snapshot was replaced
    pub snapshot_changed: bool,
}

pub struct GradePoller {
    source: Arc<dyn GradesSource>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl GradePoller {
    pub fn new(
        source: Arc<dyn GradesSource>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
        }
    }

    /// Fetches current grades and notifies for each diff entry whose course
    /// was already known: a grade arriving for a previously ungraded
    /// course, or a grade that changed. Courses never seen before are
    /// recorded silently, so the first run after install stays quiet.
    ///
    /// Without a stored token this returns [`PortalError::NoToken`] before
    /// any network traffic.
    pub async fn poll(&self) -> Result<PollReport, PortalError> {
        let token = self
            .store
            .get(keys::AUTH_TOKEN)?
            .ok_or(PortalError::NoToken)?;

        let grades = self.source.fetch_grades(&token).await?;
        let new_snapshot = GradeSnapshot::from_pairs(grades.grade_pairs());

        let stored = self
            .store
            .get(keys::GRADES)?
            .map(|raw| GradeSnapshot::decode(&raw))
            .unwrap_or_default();

        let new_entries = new_snapshot.difference(&stored);
        let mut notified = 0;
        for (slot, (course, grade)) in new_entries.iter().enumerate() {
            if stored.contains_course(course) {
                self.notifier.notify(
                    "New Grade Update",
                    &format!("New grade for {course}: {grade}"),
                    slot as u32,
                );
                notified += 1;
            } else {
                debug!(course = %course, "new course recorded without notification");
            }
        }
        let new_count = new_entries.len();

        // Full set inequality, not diff emptiness: a course dropping out of
        // the payload is a change worth persisting too.
        let snapshot_changed = new_snapshot != stored;
        if snapshot_changed {
            self.store.set(keys::GRADES, &new_snapshot.encode())?;
            info!(
                courses = new_snapshot.len(),
                notified, "grade snapshot updated"
            );
        }

        Ok(PollReport {
            new_entries: new_count,
            notified,
            snapshot_changed,
        })
    }
}
