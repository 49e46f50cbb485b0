use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use services::activity::{self, CreateActivity};

use crate::seed::Seeder;

pub struct ActivitySeeder;

#[async_trait]
impl Seeder for ActivitySeeder {
    async fn seed(&self, db: &DatabaseConnection) {
        let now = Utc::now();

        let demo_activities = [
            CreateActivity {
                title: "Prac 1: Linked Lists".to_string(),
                description: Some("Implement a doubly linked list".to_string()),
                max_attempts_per_student: 3,
                opens_at: now - Duration::days(1),
                closes_at: now + Duration::days(7),
                late_allowed: false,
                late_penalty: 0.0,
                published: true,
            },
            CreateActivity {
                title: "Prac 2: Hash Tables".to_string(),
                description: Some("Open addressing, with a grace window".to_string()),
                max_attempts_per_student: 5,
                opens_at: now - Duration::days(14),
                closes_at: now - Duration::days(1),
                late_allowed: true,
                late_penalty: 0.25,
                published: true,
            },
            CreateActivity {
                title: "Prac 3: Graphs (draft)".to_string(),
                description: None,
                max_attempts_per_student: 3,
                opens_at: now + Duration::days(7),
                closes_at: now + Duration::days(14),
                late_allowed: false,
                late_penalty: 0.0,
                published: false,
            },
        ];

        for params in demo_activities {
            activity::create(db, params)
                .await
                .expect("Failed to seed activity");
        }
    }
}
