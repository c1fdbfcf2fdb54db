//! Database migrations.
//!
//! Each migration is a separate module following SeaORM conventions.
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240102_000001_create_communities;
mod m20240103_000001_create_events;
mod m20240104_000001_create_reports;
mod m20240105_000001_create_rewards;
mod m20240106_000001_add_award_references;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240102_000001_create_communities::Migration),
            Box::new(m20240103_000001_create_events::Migration),
            Box::new(m20240104_000001_create_reports::Migration),
            Box::new(m20240105_000001_create_rewards::Migration),
            Box::new(m20240106_000001_add_award_references::Migration),
        ]
    }
}
