use chrono::Utc;
use sea_orm::Set;

use crate::models::submission;

/// Build an ungraded submission row for the given attempt slot.
pub fn make_submission(
    activity_id: i64,
    student_id: i64,
    attempt_number: i64,
) -> submission::ActiveModel {
    let now = Utc::now();

    submission::ActiveModel {
        activity_id: Set(activity_id),
        student_id: Set(student_id),
        attempt_number: Set(attempt_number),
        is_late: Set(false),
        payload: Set(serde_json::json!({ "seeded": true })),
        score: Set(None),
        feedback: Set(None),
        graded_at: Set(None),
        version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}
