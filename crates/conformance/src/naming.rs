//! Collision-free resource names of the form `{resource}_name_{epoch_millis}`.

use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

/// Issues names from the wall clock, never handing out the same millisecond twice.
///
/// When two calls land in the same millisecond (or the clock steps back) the
/// stamp is bumped to one past the last issued value.
#[derive(Debug)]
pub struct NameGenerator {
    resource: String,
    last: AtomicI64,
}

impl NameGenerator {
    pub fn new(resource: impl Into<String>) -> Self {
        NameGenerator {
            resource: resource.into(),
            last: AtomicI64::new(0),
        }
    }

    pub fn next(&self) -> String {
        self.next_at(now_millis())
    }

    fn next_at(&self, now: i64) -> String {
        let mut issued = now;
        // fetch_update only fails when the closure returns None, which it never does.
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = now.max(last + 1);
                Some(issued)
            });
        format!("{}_name_{}", self.resource, issued)
    }

    /// Prefix shared by every name this generator issues.
    pub fn prefix(&self) -> String {
        format!("{}_name_", self.resource)
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn format_matches_resource_and_timestamp() {
        let names = NameGenerator::new("widget");
        assert_eq!(names.next_at(1_700_000_000_000), "widget_name_1700000000000");
    }

    #[test]
    fn same_millisecond_is_bumped() {
        let names = NameGenerator::new("widget");
        assert_eq!(names.next_at(1_000), "widget_name_1000");
        assert_eq!(names.next_at(1_000), "widget_name_1001");
        assert_eq!(names.next_at(999), "widget_name_1002");
        assert_eq!(names.next_at(5_000), "widget_name_5000");
    }

    #[test]
    fn rapid_calls_never_collide() {
        let names = NameGenerator::new("gadget");
        let issued: HashSet<String> = (0..1_000).map(|_| names.next()).collect();
        assert_eq!(issued.len(), 1_000);
        assert!(issued.iter().all(|n| n.starts_with(&names.prefix())));
    }
}
