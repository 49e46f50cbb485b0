use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use tokio::time::sleep;
use validator::Validate;

use common::config::Config;
use db::models::submission;
use db::repositories::submission_repository::SubmissionInsertError;
use db::repositories::{activity_repository, submission_repository};

use crate::error::SubmitError;
use crate::stats::{StatsSnapshot, SubmissionStats};

pub use db::models::submission::Model as Submission;

/// One submission attempt by one student against one activity.
#[derive(Debug, Clone, Validate)]
pub struct SubmitRequest {
    #[validate(range(min = 1, message = "activity_id must be positive"))]
    pub activity_id: i64,

    #[validate(range(min = 1, message = "student_id must be positive"))]
    pub student_id: i64,

    /// Opaque to the core; stored verbatim on the submission row.
    pub payload: serde_json::Value,
}

/// What a successful submit hands back to the caller.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub submission: submission::Model,
    /// The activity version produced by this call's reservation.
    pub activity_version: i64,
    pub attempt_number: i64,
    /// Activity-wide submission count including this one, as of the
    /// reservation.
    pub total_submissions: i64,
    pub retries_used: usize,
}

/// Bounded-retry settings for version conflicts.
///
/// `backoff` is indexed by retry number; a schedule shorter than the budget
/// repeats its last entry. The delay is applied only before a retried read,
/// never before the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: vec![
                Duration::from_millis(50),
                Duration::from_millis(100),
                Duration::from_millis(200),
            ],
        }
    }
}

impl RetryPolicy {
    /// Policy from `SUBMIT_MAX_RETRIES` / `SUBMIT_BACKOFF_MS`.
    pub fn from_config() -> Self {
        let config = Config::get();
        Self {
            max_retries: config.submit_max_retries,
            backoff: config
                .submit_backoff_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        }
    }

    fn delay_for(&self, retry_index: usize) -> Duration {
        self.backoff
            .get(retry_index)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::from_millis(50))
    }
}

/// Coordinates concurrent submissions against the versioned activity row.
///
/// The protocol per call is READ -> VALIDATE -> UPDATE -> CREATE: read the
/// activity, run the business checks, reserve a slot with the version-gated
/// increment, then persist the submission. Losing the version race loops
/// back to READ with backoff; a failed persist compensates the reservation.
/// No lock is held at any point; the conditional update in the store is the
/// only serialization point.
pub struct SubmissionService {
    db: DatabaseConnection,
    policy: RetryPolicy,
    stats: Arc<SubmissionStats>,
}

impl SubmissionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_policy(db, RetryPolicy::default())
    }

    pub fn with_policy(db: DatabaseConnection, policy: RetryPolicy) -> Self {
        Self {
            db,
            policy,
            stats: Arc::new(SubmissionStats::default()),
        }
    }

    /// Swap in a shared stats collector (e.g. one owned by a reporter or by
    /// a test asserting across several services).
    pub fn with_stats(mut self, stats: Arc<SubmissionStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitReceipt, SubmitError> {
        let never_cancelled = AtomicBool::new(false);
        self.submit_with_cancel(request, &never_cancelled).await
    }

    /// Submit with a cooperative cancellation flag. Cancellation observed
    /// before the reservation aborts with no side effects; observed after,
    /// it takes the same compensation path as a failed insert.
    pub async fn submit_with_cancel(
        &self,
        request: SubmitRequest,
        cancel: &AtomicBool,
    ) -> Result<SubmitReceipt, SubmitError> {
        request.validate()?;
        self.stats.record_attempt();

        let mut retries_used = 0usize;
        // The attempt slot is pinned on the first read: a conflict retry
        // must not move this call onto the next attempt number, otherwise a
        // same-student race would silently become two attempts instead of a
        // duplicate rejection.
        let mut pinned_attempts: Option<i64> = None;

        loop {
            if cancel.load(Ordering::SeqCst) {
                return Err(SubmitError::Cancelled);
            }

            // READ
            let activity = activity_repository::get(&self.db, request.activity_id)
                .await?
                .ok_or(SubmitError::ActivityNotFound(request.activity_id))?;

            let prior_attempts = match pinned_attempts {
                Some(count) => count,
                None => {
                    let count = submission_repository::count_for_student(
                        &self.db,
                        request.activity_id,
                        request.student_id,
                    )
                    .await? as i64;
                    pinned_attempts = Some(count);
                    count
                }
            };

            // VALIDATE
            if prior_attempts >= activity.max_attempts_per_student {
                return Err(SubmitError::MaxAttemptsExceeded {
                    activity_id: activity.id,
                    student_id: request.student_id,
                    max_attempts: activity.max_attempts_per_student,
                });
            }
            let is_late = activity.is_past_close(Utc::now());
            if is_late && !activity.late_allowed {
                return Err(SubmitError::LateSubmissionRejected {
                    activity_id: activity.id,
                    student_id: request.student_id,
                    closes_at: activity.closes_at,
                });
            }
            if !activity.published {
                return Err(SubmitError::NotPublished(activity.id));
            }

            // UPDATE
            let prior_version = match activity_repository::conditional_increment(
                &self.db,
                activity.id,
                activity.version,
                1,
            )
            .await?
            {
                Some(version) => version,
                None => {
                    self.stats.record_conflict();
                    if retries_used >= self.policy.max_retries {
                        self.stats.record_retries_exhausted();
                        return Err(SubmitError::VersionConflictExhausted {
                            activity_id: activity.id,
                            student_id: request.student_id,
                            retries: retries_used,
                            last_version: activity.version,
                        });
                    }
                    sleep(self.policy.delay_for(retries_used)).await;
                    retries_used += 1;
                    continue;
                }
            };

            // CREATE. One slot is now durably reserved; from here on,
            // cancellation and insert failure are the same event at the
            // compensation boundary.
            let attempt_number = prior_attempts + 1;
            let created = if cancel.load(Ordering::SeqCst) {
                Err(SubmitError::Cancelled)
            } else {
                self.insert_submission(&request, attempt_number, is_late).await
            };

            return match created {
                Ok(created) => {
                    self.stats.record_success(retries_used > 0);
                    Ok(SubmitReceipt {
                        submission: created,
                        activity_version: prior_version + 1,
                        attempt_number,
                        total_submissions: activity.submission_count + 1,
                        retries_used,
                    })
                }
                Err(err) => {
                    self.roll_back_reservation(activity.id, prior_version).await;
                    Err(err)
                }
            };
        }
    }

    async fn insert_submission(
        &self,
        request: &SubmitRequest,
        attempt_number: i64,
        is_late: bool,
    ) -> Result<submission::Model, SubmitError> {
        let now = Utc::now();
        let model = submission::ActiveModel {
            activity_id: Set(request.activity_id),
            student_id: Set(request.student_id),
            attempt_number: Set(attempt_number),
            is_late: Set(is_late),
            payload: Set(request.payload.clone()),
            score: Set(None),
            feedback: Set(None),
            graded_at: Set(None),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        submission_repository::insert(&self.db, model)
            .await
            .map_err(|err| match err {
                SubmissionInsertError::Duplicate => SubmitError::DuplicateAttempt {
                    activity_id: request.activity_id,
                    student_id: request.student_id,
                    attempt_number,
                },
                SubmissionInsertError::Db(db_err) => SubmitError::Database(db_err),
            })
    }

    /// Best-effort compensation for a reservation whose submission never
    /// made it in. Targets the version our own reservation produced, so a
    /// miss means another writer has moved the row on; the count then stays
    /// one high until `reconcile_submission_count` corrects it. The caller
    /// always sees the original failure, not a rollback error.
    async fn roll_back_reservation(&self, activity_id: i64, prior_version: i64) {
        match activity_repository::conditional_increment(
            &self.db,
            activity_id,
            prior_version + 1,
            -1,
        )
        .await
        {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::warn!(
                    "rollback lost the race on activity {activity_id}: submission_count is one high until reconciled"
                );
            }
            Err(err) => {
                log::warn!("rollback failed on activity {activity_id}: {err}");
            }
        }
    }

    /// Recompute `submission_count` from the persisted rows — the safety net
    /// for compensations that lost their race. Returns the signed drift that
    /// was corrected (0 when the counter was already accurate).
    pub async fn reconcile_submission_count(&self, activity_id: i64) -> Result<i64, SubmitError> {
        loop {
            let activity = activity_repository::get(&self.db, activity_id)
                .await?
                .ok_or(SubmitError::ActivityNotFound(activity_id))?;
            let actual =
                submission_repository::count_for_activity(&self.db, activity_id).await? as i64;

            let drift = activity.submission_count - actual;
            if drift == 0 {
                return Ok(0);
            }

            if activity_repository::set_submission_count(
                &self.db,
                activity_id,
                activity.version,
                actual,
            )
            .await?
            .is_some()
            {
                log::info!(
                    "reconciled activity {activity_id}: submission_count {} -> {actual}",
                    activity.submission_count
                );
                return Ok(drift);
            }
            // Lost to a concurrent submission; re-read and try again.
        }
    }
}
