//! Badge catalog database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Badge;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "badges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub price: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Badge {
    fn from(model: Model) -> Self {
        Badge {
            id: model.id,
            name: model.name,
            description: model.description,
            icon: model.icon,
            price: model.price,
            created_at: model.created_at,
        }
    }
}
