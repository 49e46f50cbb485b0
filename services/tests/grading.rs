use chrono::Duration;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use db::factories::activity_factory::make_activity;
use db::test_utils::setup_test_db;
use services::error::GradeError;
use services::grading::{GradeSubmission, GradingService};
use services::submission::{SubmissionService, SubmitRequest};

async fn submitted_id(db: &DatabaseConnection, activity_id: i64, student_id: i64) -> i64 {
    SubmissionService::new(db.clone())
        .submit(SubmitRequest {
            activity_id,
            student_id,
            payload: serde_json::json!({ "answer": "ontime" }),
        })
        .await
        .unwrap()
        .submission
        .id
}

fn grade(score: f64, feedback: &str) -> GradeSubmission {
    GradeSubmission {
        score,
        feedback: Some(feedback.to_string()),
    }
}

#[tokio::test]
async fn grading_applies_the_patch_and_bumps_the_submission_version() {
    let db = setup_test_db().await;
    let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
        .insert(&db)
        .await
        .unwrap();
    let submission_id = submitted_id(&db, activity.id, 7).await;
    let grading = GradingService::new(db.clone());

    let fetched = grading.get_with_version(submission_id).await.unwrap();
    assert_eq!(fetched.submission.version, 1);
    // The activity moved once, for the submission itself.
    assert_eq!(fetched.activity_version, 2);

    let graded = grading
        .grade(submission_id, grade(87.5, "solid"), fetched.submission.version)
        .await
        .unwrap();
    assert_eq!(graded.score, Some(87.5));
    assert_eq!(graded.feedback.as_deref(), Some("solid"));
    assert!(graded.graded_at.is_some());
    assert_eq!(graded.version, 2);

    // Grading is scoped to the submission; the activity is untouched.
    let refreshed = grading.get_with_version(submission_id).await.unwrap();
    assert_eq!(refreshed.activity_version, 2);
}

#[tokio::test]
async fn a_stale_grader_is_told_the_current_version() {
    let db = setup_test_db().await;
    let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
        .insert(&db)
        .await
        .unwrap();
    let submission_id = submitted_id(&db, activity.id, 7).await;
    let grading = GradingService::new(db.clone());

    grading
        .grade(submission_id, grade(60.0, "first pass"), 1)
        .await
        .unwrap();

    let err = grading
        .grade(submission_id, grade(70.0, "second pass"), 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GradeError::VersionConflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));
    assert_eq!(err.code(), "version_conflict");

    // Re-reading the version makes the retry succeed.
    let regraded = grading
        .grade(submission_id, grade(70.0, "second pass"), 2)
        .await
        .unwrap();
    assert_eq!(regraded.score, Some(70.0));
    assert_eq!(regraded.version, 3);
}

#[tokio::test]
async fn late_submissions_lose_the_penalty_fraction() {
    let db = setup_test_db().await;
    let mut closed = make_activity("Prac 1", 3, Duration::hours(-1), true, true);
    closed.late_penalty = Set(0.25);
    let activity = closed.insert(&db).await.unwrap();

    let submission_id = submitted_id(&db, activity.id, 7).await;
    let grading = GradingService::new(db.clone());

    let graded = grading
        .grade(submission_id, grade(80.0, "late but fine"), 1)
        .await
        .unwrap();
    assert!(graded.is_late);
    assert_eq!(graded.score, Some(60.0));
}

#[tokio::test]
async fn grading_a_missing_submission_fails_cleanly() {
    let db = setup_test_db().await;
    let grading = GradingService::new(db.clone());

    let err = grading.grade(4242, grade(50.0, "?"), 1).await.unwrap_err();
    assert!(matches!(err, GradeError::SubmissionNotFound(4242)));

    let err = grading.get_with_version(4242).await.unwrap_err();
    assert!(matches!(err, GradeError::SubmissionNotFound(4242)));
}

#[tokio::test]
async fn negative_scores_are_rejected_before_touching_the_row() {
    let db = setup_test_db().await;
    let activity = make_activity("Prac 1", 3, Duration::hours(1), false, true)
        .insert(&db)
        .await
        .unwrap();
    let submission_id = submitted_id(&db, activity.id, 7).await;
    let grading = GradingService::new(db.clone());

    let err = grading
        .grade(submission_id, grade(-1.0, "nope"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, GradeError::InvalidGrade(_)));

    let untouched = grading.get_with_version(submission_id).await.unwrap();
    assert_eq!(untouched.submission.version, 1);
    assert!(untouched.submission.score.is_none());
}
