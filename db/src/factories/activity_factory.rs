use chrono::{Duration, Utc};
use sea_orm::Set;

use crate::models::activity;

/// Build an activity ready to insert. `closes_in` is relative to now, so a
/// negative duration yields an already-closed window.
pub fn make_activity(
    title: &str,
    max_attempts_per_student: i64,
    closes_in: Duration,
    late_allowed: bool,
    published: bool,
) -> activity::ActiveModel {
    let now = Utc::now();

    activity::ActiveModel {
        title: Set(title.to_string()),
        description: Set(None),
        version: Set(1),
        submission_count: Set(0),
        max_attempts_per_student: Set(max_attempts_per_student),
        opens_at: Set(now - Duration::hours(1)),
        closes_at: Set(now + closes_in),
        late_allowed: Set(late_allowed),
        late_penalty: Set(0.0),
        published: Set(published),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}
