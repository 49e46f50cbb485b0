use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use db::models::activity;
use services::submission::{RetryPolicy, SubmissionService, SubmitRequest};

use crate::seed::Seeder;

pub struct SubmissionSeeder;

#[async_trait]
impl Seeder for SubmissionSeeder {
    /// Fires a concurrent burst through the real submit path against the
    /// first published activity: eight distinct students plus one student
    /// racing itself, then logs the collected stats.
    async fn seed(&self, db: &DatabaseConnection) {
        let target = activity::Entity::find()
            .filter(activity::Column::Published.eq(true))
            .order_by_asc(activity::Column::Id)
            .one(db)
            .await
            .expect("Failed to query activities")
            .expect("No published activity to submit against");

        let service = Arc::new(SubmissionService::with_policy(
            db.clone(),
            RetryPolicy::from_config(),
        ));

        let mut handles = Vec::new();
        for student_id in 1..=8 {
            let service = Arc::clone(&service);
            let activity_id = target.id;
            handles.push(tokio::spawn(async move {
                service
                    .submit(SubmitRequest {
                        activity_id,
                        student_id,
                        payload: serde_json::json!({
                            "answer": fastrand::i32(0..100),
                        }),
                    })
                    .await
            }));
        }
        // Student 1 races itself; at most one of the pair can land.
        {
            let service = Arc::clone(&service);
            let activity_id = target.id;
            handles.push(tokio::spawn(async move {
                service
                    .submit(SubmitRequest {
                        activity_id,
                        student_id: 1,
                        payload: serde_json::json!({ "answer": fastrand::i32(0..100) }),
                    })
                    .await
            }));
        }

        for result in futures::future::join_all(handles).await {
            match result.expect("submission task panicked") {
                Ok(receipt) => log::info!(
                    "seeded submission {} (student {}, attempt {}, {} retries)",
                    receipt.submission.id,
                    receipt.submission.student_id,
                    receipt.attempt_number,
                    receipt.retries_used
                ),
                Err(err) => log::info!("seed submission rejected [{}]: {}", err.code(), err),
            }
        }

        let stats = service.stats();
        log::info!(
            "seed burst done: {} attempts, {} committed, {} conflicts ({} retried through, {} exhausted)",
            stats.total_attempts,
            stats.successful_submissions,
            stats.conflicts,
            stats.retries_succeeded,
            stats.retries_failed
        );
    }
}
