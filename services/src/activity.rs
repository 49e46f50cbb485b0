use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use validator::Validate;

use db::models::activity;
use db::repositories::activity_repository;

use crate::error::ActivityError;

pub use db::models::activity::Model as Activity;

/// Parameters for creating a new activity.
#[derive(Debug, Clone, Validate)]
pub struct CreateActivity {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(range(min = 1, message = "max_attempts_per_student must be at least 1"))]
    pub max_attempts_per_student: i64,

    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub late_allowed: bool,

    #[validate(range(
        min = 0.0,
        max = 1.0,
        message = "late_penalty must be a fraction between 0 and 1"
    ))]
    pub late_penalty: f64,

    pub published: bool,
}

/// Insert a new activity with a fresh version token and an empty counter.
/// After this, the row is only ever mutated through the conditional update
/// in the activity repository.
pub async fn create(
    db: &DatabaseConnection,
    params: CreateActivity,
) -> Result<Activity, ActivityError> {
    params.validate()?;
    if params.closes_at <= params.opens_at {
        return Err(ActivityError::InvalidWindow {
            opens_at: params.opens_at,
            closes_at: params.closes_at,
        });
    }

    let now = Utc::now();
    let model = activity::ActiveModel {
        title: Set(params.title),
        description: Set(params.description),
        version: Set(1),
        submission_count: Set(0),
        max_attempts_per_student: Set(params.max_attempts_per_student),
        opens_at: Set(params.opens_at),
        closes_at: Set(params.closes_at),
        late_allowed: Set(params.late_allowed),
        late_penalty: Set(params.late_penalty),
        published: Set(params.published),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(model.insert(db).await?)
}

pub async fn find(db: &DatabaseConnection, id: i64) -> Result<Option<Activity>, DbErr> {
    activity_repository::get(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use db::test_utils::setup_test_db;

    fn valid_params() -> CreateActivity {
        let now = Utc::now();
        CreateActivity {
            title: "Prac 1".to_string(),
            description: Some("Linked lists".to_string()),
            max_attempts_per_student: 3,
            opens_at: now,
            closes_at: now + Duration::days(7),
            late_allowed: true,
            late_penalty: 0.25,
            published: true,
        }
    }

    #[tokio::test]
    async fn create_starts_with_fresh_version_and_empty_counter() {
        let db = setup_test_db().await;
        let created = create(&db, valid_params()).await.unwrap();

        assert_eq!(created.version, 1);
        assert_eq!(created.submission_count, 0);
        assert_eq!(created.max_attempts_per_student, 3);

        let found = find(&db, created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn create_rejects_empty_title_and_zero_quota() {
        let db = setup_test_db().await;

        let mut params = valid_params();
        params.title = String::new();
        assert!(matches!(
            create(&db, params).await,
            Err(ActivityError::Invalid(_))
        ));

        let mut params = valid_params();
        params.max_attempts_per_student = 0;
        assert!(matches!(
            create(&db, params).await,
            Err(ActivityError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn create_rejects_a_window_that_closes_before_it_opens() {
        let db = setup_test_db().await;

        let mut params = valid_params();
        params.closes_at = params.opens_at - Duration::hours(1);
        assert!(matches!(
            create(&db, params).await,
            Err(ActivityError::InvalidWindow { .. })
        ));
    }
}
