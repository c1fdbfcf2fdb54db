//! Report database entity.

use sea_orm::entity::prelude::*;

use crate::domain::{ModerationAction, Report, ReportStatus, ReportTarget};
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub community_id: Uuid,
    pub reporter_id: Uuid,
    pub target_type: String,
    pub target_id: Uuid,
    pub reason: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    pub status: String,
    pub resolution: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_note: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Report {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Report {
            id: model.id,
            community_id: model.community_id,
            reporter_id: model.reporter_id,
            target_type: model.target_type.parse::<ReportTarget>()?,
            target_id: model.target_id,
            reason: model.reason,
            details: model.details,
            status: model.status.parse::<ReportStatus>()?,
            resolution: model
                .resolution
                .as_deref()
                .map(str::parse::<ModerationAction>)
                .transpose()?,
            resolution_note: model.resolution_note,
            resolved_by: model.resolved_by,
            created_at: model.created_at,
            resolved_at: model.resolved_at,
        })
    }
}
