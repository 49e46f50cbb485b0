use crate::models::activity;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One student's recorded attempt against an activity.
///
/// Rows are unique per `(activity_id, student_id, attempt_number)`; a
/// concurrent duplicate by the same student lands on the same attempt slot
/// and is rejected by the database. Once created, a submission is only
/// mutated through its own version-gated grading update, never by the
/// submission path.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    /// Primary key of the submission.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the activity submitted against.
    pub activity_id: i64,
    /// ID of the student who submitted.
    pub student_id: i64,
    /// 1-based attempt slot for this student on this activity.
    pub attempt_number: i64,
    /// Whether the submission arrived after the window closed.
    pub is_late: bool,
    /// Caller-supplied payload, opaque to the core.
    pub payload: Json,
    /// Score assigned by grading, absent until graded.
    pub score: Option<f64>,
    /// Feedback attached by grading.
    pub feedback: Option<String>,
    /// When the submission was graded.
    pub graded_at: Option<DateTime<Utc>>,
    /// The submission's own optimistic concurrency token, starts at 1.
    /// Independent of the owning activity's version.
    pub version: i64,
    /// Timestamp when the submission was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the submission was last updated.
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the activity this submission belongs to.
    #[sea_orm(
        belongs_to = "super::activity::Entity",
        from = "Column::ActivityId",
        to = "super::activity::Column::Id"
    )]
    Activity,
}

impl Related<activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
