use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::models::activity::{Column, Entity, Model};

/// Fetch an activity by id. Read-only, no side effects.
pub async fn get(db: &DatabaseConnection, id: i64) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id).one(db).await
}

/// Version-gated mutation of the activity row, the sole serialization point
/// for concurrent submissions.
///
/// Issues a single conditional `UPDATE ... WHERE id = ? AND version = ?`
/// moving `version` and `submission_count` together by `delta` (+1 for a
/// reservation, -1 for compensation). The database applies the statement
/// atomically; this must never be decomposed into a read followed by a
/// write.
///
/// Returns `Some(prior_version)` when the row matched and was updated, and
/// `None` when the stored version differed or the row no longer exists, in
/// which case nothing was mutated.
pub async fn conditional_increment(
    db: &DatabaseConnection,
    id: i64,
    expected_version: i64,
    delta: i64,
) -> Result<Option<i64>, DbErr> {
    let result = Entity::update_many()
        .col_expr(Column::Version, Expr::col(Column::Version).add(delta))
        .col_expr(
            Column::SubmissionCount,
            Expr::col(Column::SubmissionCount).add(delta),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    Ok((result.rows_affected == 1).then_some(expected_version))
}

/// Version-gated overwrite of `submission_count`, used by the reconciliation
/// sweep. Bumps `version` by one so concurrent submissions observe the
/// correction as a conflict instead of clobbering it.
///
/// Returns `Some(prior_version)` when applied, `None` on a version mismatch.
pub async fn set_submission_count(
    db: &DatabaseConnection,
    id: i64,
    expected_version: i64,
    submission_count: i64,
) -> Result<Option<i64>, DbErr> {
    let result = Entity::update_many()
        .col_expr(Column::SubmissionCount, Expr::value(submission_count))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    Ok((result.rows_affected == 1).then_some(expected_version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::activity_factory::make_activity;
    use crate::test_utils::setup_test_db;
    use chrono::Duration;
    use sea_orm::ActiveModelTrait;

    #[tokio::test]
    async fn conditional_increment_moves_version_and_count_together() {
        let db = setup_test_db().await;
        let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
            .insert(&db)
            .await
            .unwrap();

        let prior = conditional_increment(&db, activity.id, 1, 1).await.unwrap();
        assert_eq!(prior, Some(1));

        let refreshed = get(&db, activity.id).await.unwrap().unwrap();
        assert_eq!(refreshed.version, 2);
        assert_eq!(refreshed.submission_count, 1);
    }

    #[tokio::test]
    async fn conditional_increment_rejects_stale_version_without_mutation() {
        let db = setup_test_db().await;
        let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
            .insert(&db)
            .await
            .unwrap();

        assert_eq!(
            conditional_increment(&db, activity.id, 1, 1).await.unwrap(),
            Some(1)
        );
        // A second caller that still holds version 1 must lose.
        assert_eq!(
            conditional_increment(&db, activity.id, 1, 1).await.unwrap(),
            None
        );

        let refreshed = get(&db, activity.id).await.unwrap().unwrap();
        assert_eq!(refreshed.version, 2);
        assert_eq!(refreshed.submission_count, 1);
    }

    #[tokio::test]
    async fn conditional_increment_on_missing_row_is_a_clean_miss() {
        let db = setup_test_db().await;
        assert_eq!(conditional_increment(&db, 4242, 1, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn compensation_restores_the_pre_reservation_state() {
        let db = setup_test_db().await;
        let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
            .insert(&db)
            .await
            .unwrap();

        let prior = conditional_increment(&db, activity.id, 1, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            conditional_increment(&db, activity.id, prior + 1, -1)
                .await
                .unwrap(),
            Some(prior + 1)
        );

        let refreshed = get(&db, activity.id).await.unwrap().unwrap();
        assert_eq!(refreshed.version, 1);
        assert_eq!(refreshed.submission_count, 0);
    }

    #[tokio::test]
    async fn set_submission_count_is_version_gated() {
        let db = setup_test_db().await;
        let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
            .insert(&db)
            .await
            .unwrap();

        assert_eq!(
            set_submission_count(&db, activity.id, 1, 7).await.unwrap(),
            Some(1)
        );
        let refreshed = get(&db, activity.id).await.unwrap().unwrap();
        assert_eq!(refreshed.submission_count, 7);
        assert_eq!(refreshed.version, 2);

        // Stale writers are rejected.
        assert_eq!(
            set_submission_count(&db, activity.id, 1, 0).await.unwrap(),
            None
        );
    }
}
