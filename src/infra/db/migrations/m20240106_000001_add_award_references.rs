//! Migration: Tie ledger awards to what earned them and allow one open
//! report per reporter and target.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(PointTransactions::Table)
                    .add_column(ColumnDef::new(PointTransactions::ReferenceId).uuid().null())
                    .to_owned(),
            )
            .await?;

        // Partial indexes are not expressible through the index builder
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE UNIQUE INDEX uq_point_transactions_reference \
             ON point_transactions (user_id, reason, reference_id) \
             WHERE reference_id IS NOT NULL",
        )
        .await?;
        db.execute_unprepared(
            "CREATE UNIQUE INDEX uq_reports_open_per_reporter \
             ON reports (reporter_id, community_id, target_type, target_id) \
             WHERE status IN ('pending', 'under_review')",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS uq_reports_open_per_reporter")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS uq_point_transactions_reference")
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(PointTransactions::Table)
                    .drop_column(PointTransactions::ReferenceId)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum PointTransactions {
    Table,
    ReferenceId,
}
