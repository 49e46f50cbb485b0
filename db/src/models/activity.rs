use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A published piece of work that students submit against.
///
/// The row doubles as the serialization point for concurrent submissions:
/// `version` is the optimistic-concurrency token and `submission_count`
/// mirrors the number of persisted submissions. Both are only ever moved
/// together through the conditional update in the activity repository.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    /// Primary key of the activity.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Optimistic concurrency token, starts at 1. Incremented by a
    /// reservation, decremented only when a reservation is compensated.
    pub version: i64,
    /// Mirror of the number of persisted submissions for this activity.
    pub submission_count: i64,
    /// Hard per-student attempt quota, at least 1, immutable after creation.
    pub max_attempts_per_student: i64,
    /// Start of the submission window.
    pub opens_at: DateTime<Utc>,
    /// End of the submission window; submissions after this are late.
    pub closes_at: DateTime<Utc>,
    /// Whether late submissions are accepted at all.
    pub late_allowed: bool,
    /// Fraction of the raw score deducted when grading a late submission.
    pub late_penalty: f64,
    /// Submissions may only be created while published.
    pub published: bool,
    /// Timestamp when the activity was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the activity was last updated.
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Submissions recorded against this activity.
    #[sea_orm(has_many = "super::submission::Entity")]
    Submission,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether `now` falls after the close of the submission window.
    pub fn is_past_close(&self, now: DateTime<Utc>) -> bool {
        now > self.closes_at
    }
}
