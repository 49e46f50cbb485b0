use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

/// Terminal outcomes of a submit call.
///
/// Business rejections (quota, lateness, publication, duplicate) are
/// deterministic given the state they were computed against and are never
/// retried. Version conflicts are retried internally and only surface as
/// [`SubmitError::VersionConflictExhausted`] once the budget runs out.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("activity {0} not found")]
    ActivityNotFound(i64),

    #[error(
        "student {student_id} has used all {max_attempts} attempts for activity {activity_id}"
    )]
    MaxAttemptsExceeded {
        activity_id: i64,
        student_id: i64,
        max_attempts: i64,
    },

    #[error("activity {activity_id} closed at {closes_at} and does not accept late submissions")]
    LateSubmissionRejected {
        activity_id: i64,
        student_id: i64,
        closes_at: DateTime<Utc>,
    },

    #[error("activity {0} is not published")]
    NotPublished(i64),

    #[error(
        "student {student_id} already holds attempt {attempt_number} on activity {activity_id}"
    )]
    DuplicateAttempt {
        activity_id: i64,
        student_id: i64,
        attempt_number: i64,
    },

    #[error(
        "gave up on activity {activity_id} after {retries} retries; last saw version {last_version}"
    )]
    VersionConflictExhausted {
        activity_id: i64,
        student_id: i64,
        retries: usize,
        last_version: i64,
    },

    #[error("submission was cancelled by the caller")]
    Cancelled,

    #[error("invalid submit request: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl SubmitError {
    /// Stable machine-readable code so callers can tell a user *why* a
    /// submission was rejected, not just that it failed.
    pub fn code(&self) -> &'static str {
        match self {
            SubmitError::ActivityNotFound(_) => "activity_not_found",
            SubmitError::MaxAttemptsExceeded { .. } => "max_attempts_exceeded",
            SubmitError::LateSubmissionRejected { .. } => "late_submission_rejected",
            SubmitError::NotPublished(_) => "not_published",
            SubmitError::DuplicateAttempt { .. } => "duplicate_attempt",
            SubmitError::VersionConflictExhausted { .. } => "version_conflict_exhausted",
            SubmitError::Cancelled => "cancelled",
            SubmitError::InvalidRequest(_) => "invalid_request",
            SubmitError::Database(_) => "store_unavailable",
        }
    }
}

/// Failures of the version-gated grading path.
#[derive(Debug, Error)]
pub enum GradeError {
    #[error("submission {0} not found")]
    SubmissionNotFound(i64),

    #[error("activity {0} not found")]
    ActivityNotFound(i64),

    #[error(
        "submission {submission_id} changed underneath the update: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        submission_id: i64,
        expected: i64,
        actual: i64,
    },

    #[error("invalid grade: {0}")]
    InvalidGrade(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl GradeError {
    pub fn code(&self) -> &'static str {
        match self {
            GradeError::SubmissionNotFound(_) => "submission_not_found",
            GradeError::ActivityNotFound(_) => "activity_not_found",
            GradeError::VersionConflict { .. } => "version_conflict",
            GradeError::InvalidGrade(_) => "invalid_grade",
            GradeError::Database(_) => "store_unavailable",
        }
    }
}

/// Failures when creating an activity.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("invalid activity: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("activity window closes at {closes_at}, before it opens at {opens_at}")]
    InvalidWindow {
        opens_at: DateTime<Utc>,
        closes_at: DateTime<Utc>,
    },

    #[error(transparent)]
    Database(#[from] DbErr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_error_codes_are_distinct_per_rejection_reason() {
        let errors = [
            SubmitError::ActivityNotFound(1),
            SubmitError::MaxAttemptsExceeded {
                activity_id: 1,
                student_id: 2,
                max_attempts: 3,
            },
            SubmitError::LateSubmissionRejected {
                activity_id: 1,
                student_id: 2,
                closes_at: Utc::now(),
            },
            SubmitError::NotPublished(1),
            SubmitError::DuplicateAttempt {
                activity_id: 1,
                student_id: 2,
                attempt_number: 1,
            },
            SubmitError::VersionConflictExhausted {
                activity_id: 1,
                student_id: 2,
                retries: 3,
                last_version: 9,
            },
            SubmitError::Cancelled,
        ];

        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }
}
