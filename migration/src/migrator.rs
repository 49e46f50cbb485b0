use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202608070001_create_activities::Migration),
            Box::new(migrations::m202608070002_create_submissions::Migration),
        ]
    }
}
