use common::config;
use common::logger::init_logger;
use migration::Migrator;
use sea_orm_migration::MigratorTrait;

use crate::seed::{Seeder, run_seeder};
use crate::seeds::{activity::ActivitySeeder, submission::SubmissionSeeder};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    init_logger(
        &config::log_level(),
        &config::log_file(),
        config::log_to_stdout(),
    );

    let db = db::connect().await;
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    for (seeder, name) in [
        (
            Box::new(ActivitySeeder) as Box<dyn Seeder + Send + Sync>,
            "Activity",
        ),
        (Box::new(SubmissionSeeder), "Submission"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
