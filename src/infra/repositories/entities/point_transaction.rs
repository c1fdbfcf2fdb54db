//! Points ledger database entity.

use sea_orm::entity::prelude::*;

use crate::domain::PointTransaction;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "point_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub reason: String,
    /// Event, report or other row the award is tied to
    pub reference_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PointTransaction {
    fn from(model: Model) -> Self {
        PointTransaction {
            id: model.id,
            user_id: model.user_id,
            amount: model.amount,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}
