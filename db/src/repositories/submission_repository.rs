use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use thiserror::Error;

use crate::models::submission::{ActiveModel, Column, Entity, Model};

/// Failure modes when persisting a submission row.
#[derive(Debug, Error)]
pub enum SubmissionInsertError {
    /// The (activity, student, attempt) slot is already taken.
    #[error("submission already exists for this activity, student and attempt")]
    Duplicate,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Persist a submission. The generated id and the row's own version token
/// come back on the returned model. A collision on the unique
/// (activity_id, student_id, attempt_number) index maps to
/// [`SubmissionInsertError::Duplicate`].
pub async fn insert(
    db: &DatabaseConnection,
    submission: ActiveModel,
) -> Result<Model, SubmissionInsertError> {
    submission.insert(db).await.map_err(|err| {
        if err.to_string().contains("UNIQUE constraint failed") {
            SubmissionInsertError::Duplicate
        } else {
            SubmissionInsertError::Db(err)
        }
    })
}

pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id).one(db).await
}

/// Number of submissions a student has recorded against an activity.
pub async fn count_for_student(
    db: &DatabaseConnection,
    activity_id: i64,
    student_id: i64,
) -> Result<u64, DbErr> {
    Entity::find()
        .filter(Column::ActivityId.eq(activity_id))
        .filter(Column::StudentId.eq(student_id))
        .count(db)
        .await
}

/// Number of submissions recorded against an activity, all students.
pub async fn count_for_activity(db: &DatabaseConnection, activity_id: i64) -> Result<u64, DbErr> {
    Entity::find()
        .filter(Column::ActivityId.eq(activity_id))
        .count(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::activity_factory::make_activity;
    use crate::factories::submission_factory::make_submission;
    use crate::test_utils::setup_test_db;
    use chrono::Duration;
    use sea_orm::ActiveModelTrait;

    #[tokio::test]
    async fn insert_assigns_id_and_fresh_version() {
        let db = setup_test_db().await;
        let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
            .insert(&db)
            .await
            .unwrap();

        let created = insert(&db, make_submission(activity.id, 7, 1))
            .await
            .unwrap();

        assert!(created.id > 0);
        assert_eq!(created.version, 1);
        assert_eq!(created.attempt_number, 1);
        assert!(created.score.is_none());
        assert!(created.graded_at.is_none());
    }

    #[tokio::test]
    async fn second_insert_on_the_same_attempt_slot_is_a_duplicate() {
        let db = setup_test_db().await;
        let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
            .insert(&db)
            .await
            .unwrap();

        insert(&db, make_submission(activity.id, 7, 1)).await.unwrap();

        let err = insert(&db, make_submission(activity.id, 7, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionInsertError::Duplicate));

        // A different slot for the same student is fine.
        insert(&db, make_submission(activity.id, 7, 2)).await.unwrap();
        // As is the same slot for a different student.
        insert(&db, make_submission(activity.id, 8, 1)).await.unwrap();
    }

    #[tokio::test]
    async fn counts_split_per_student_and_per_activity() {
        let db = setup_test_db().await;
        let activity = make_activity("Prac 1", 5, Duration::hours(1), false, true)
            .insert(&db)
            .await
            .unwrap();

        insert(&db, make_submission(activity.id, 7, 1)).await.unwrap();
        insert(&db, make_submission(activity.id, 7, 2)).await.unwrap();
        insert(&db, make_submission(activity.id, 8, 1)).await.unwrap();

        assert_eq!(count_for_student(&db, activity.id, 7).await.unwrap(), 2);
        assert_eq!(count_for_student(&db, activity.id, 8).await.unwrap(), 1);
        assert_eq!(count_for_student(&db, activity.id, 9).await.unwrap(), 0);
        assert_eq!(count_for_activity(&db, activity.id).await.unwrap(), 3);
    }
}
