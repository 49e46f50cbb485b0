use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use validator::Validate;

use db::models::submission;
use db::models::submission::{Column, Entity};
use db::repositories::{activity_repository, submission_repository};

use crate::error::GradeError;

/// A grading patch, applied only if the submission still carries the
/// version the grader read it at.
#[derive(Debug, Clone, Validate)]
pub struct GradeSubmission {
    #[validate(range(min = 0.0, message = "score cannot be negative"))]
    pub score: f64,

    pub feedback: Option<String>,
}

/// A submission together with its activity's current version, so a caller
/// can hold both tokens before deciding on a follow-up write.
#[derive(Debug, Clone)]
pub struct SubmissionWithVersion {
    pub submission: submission::Model,
    pub activity_version: i64,
}

/// Version-gated updates to individual submissions.
///
/// Grading follows the same conditional-update contract as the activity row
/// but against the submission's own version token, so it never contends
/// with submission traffic.
pub struct GradingService {
    db: DatabaseConnection,
}

impl GradingService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch a submission plus the version of the activity it belongs to.
    pub async fn get_with_version(
        &self,
        submission_id: i64,
    ) -> Result<SubmissionWithVersion, GradeError> {
        let submission = submission_repository::find_by_id(&self.db, submission_id)
            .await?
            .ok_or(GradeError::SubmissionNotFound(submission_id))?;
        let activity = activity_repository::get(&self.db, submission.activity_id)
            .await?
            .ok_or(GradeError::ActivityNotFound(submission.activity_id))?;

        Ok(SubmissionWithVersion {
            submission,
            activity_version: activity.version,
        })
    }

    /// Apply a grade if and only if the submission still carries
    /// `expected_version`. A late submission has the activity's late
    /// penalty deducted from the raw score, floored at zero.
    pub async fn grade(
        &self,
        submission_id: i64,
        patch: GradeSubmission,
        expected_version: i64,
    ) -> Result<submission::Model, GradeError> {
        patch.validate()?;

        let current = submission_repository::find_by_id(&self.db, submission_id)
            .await?
            .ok_or(GradeError::SubmissionNotFound(submission_id))?;
        let activity = activity_repository::get(&self.db, current.activity_id)
            .await?
            .ok_or(GradeError::ActivityNotFound(current.activity_id))?;

        let score = if current.is_late {
            (patch.score * (1.0 - activity.late_penalty)).max(0.0)
        } else {
            patch.score
        };

        let now = Utc::now();
        let result = Entity::update_many()
            .col_expr(Column::Score, Expr::value(Some(score)))
            .col_expr(Column::Feedback, Expr::value(patch.feedback.clone()))
            .col_expr(Column::GradedAt, Expr::value(Some(now)))
            .col_expr(Column::Version, Expr::col(Column::Version).add(1))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(submission_id))
            .filter(Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            let actual = submission_repository::find_by_id(&self.db, submission_id)
                .await?
                .ok_or(GradeError::SubmissionNotFound(submission_id))?;
            return Err(GradeError::VersionConflict {
                submission_id,
                expected: expected_version,
                actual: actual.version,
            });
        }

        submission_repository::find_by_id(&self.db, submission_id)
            .await?
            .ok_or(GradeError::SubmissionNotFound(submission_id))
    }
}
