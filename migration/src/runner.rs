use colored::*;
use futures::FutureExt;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 72;

pub async fn run_all_migrations(url: &str) {
    let db = sea_orm::Database::connect(url)
        .await
        .expect("DB connection failed");
    let schema_manager = SchemaManager::new(&db);

    let migrations = <migration::Migrator as MigratorTrait>::migrations();
    let total = migrations.len();
    println!("Running {total} migration(s)...");

    let start = Instant::now();
    for (index, migration) in migrations.into_iter().enumerate() {
        let label = format!("[{}/{}] {}", index + 1, total, migration.name().bold());
        let dots = ".".repeat(STATUS_COLUMN.saturating_sub(label.len()));
        print!("{label}{dots} ");
        io::stdout().flush().unwrap();

        let step = Instant::now();
        let outcome = std::panic::AssertUnwindSafe(migration.up(&schema_manager))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                println!("{} {}", "done".green(), format!("({:.2?})", step.elapsed()).dimmed());
            }
            Ok(Err(err)) => {
                println!("{} {}", "failed".red(), err);
                std::process::exit(1);
            }
            Err(_) => {
                println!("{}", "panicked".red());
                std::process::exit(1);
            }
        }
    }

    println!("All migrations applied in {:.2?}", start.elapsed());
}
