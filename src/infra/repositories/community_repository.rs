//! Community and membership repository.

use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::entities::{
    community::{self, Entity as CommunityEntity},
    community_member::{self, Entity as MemberEntity},
    user::{self, Entity as UserEntity},
};
use crate::domain::{
    Community, CommunityChanges, CommunityFilter, Member, MemberRole, Membership, NewCommunity,
    UserCommunity,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Insert the community and make `created_by` its admin, atomically
    async fn create(&self, created_by: Uuid, new: NewCommunity) -> AppResult<Community>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Community>>;

    /// Case-insensitive name lookup
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Community>>;

    /// Newest first, with the unpaginated total
    async fn list(
        &self,
        filter: CommunityFilter,
        params: PaginationParams,
    ) -> AppResult<(Vec<Community>, u64)>;

    async fn update(&self, id: Uuid, changes: CommunityChanges) -> AppResult<Community>;

    /// Membership row for the pair, banned rows included
    async fn membership(&self, community_id: Uuid, user_id: Uuid)
        -> AppResult<Option<Membership>>;

    async fn add_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> AppResult<Membership>;

    async fn set_member_role(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> AppResult<Membership>;

    /// Returns whether a row was removed
    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Members excluding banned users
    async fn count_members(&self, community_id: Uuid) -> AppResult<u64>;

    async fn count_admins(&self, community_id: Uuid) -> AppResult<u64>;

    /// Active members with their display names, oldest membership first
    async fn list_members(&self, community_id: Uuid) -> AppResult<Vec<Member>>;

    /// User ids of active members holding one of `roles`
    async fn member_ids(&self, community_id: Uuid, roles: Vec<MemberRole>) -> AppResult<Vec<Uuid>>;

    /// Communities the user belongs to (banned memberships excluded)
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<UserCommunity>>;

    /// Every community the user has a membership row in, banned included
    async fn membership_community_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;
}

pub struct CommunityStore {
    db: DatabaseConnection,
}

impl CommunityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_membership_model(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<community_member::Model>> {
        let model = MemberEntity::find()
            .filter(community_member::Column::CommunityId.eq(community_id))
            .filter(community_member::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model)
    }
}

fn member_row(community_id: Uuid, user_id: Uuid, role: MemberRole) -> community_member::ActiveModel {
    community_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        community_id: Set(community_id),
        user_id: Set(user_id),
        role: Set(role.as_str().to_string()),
        joined_at: Set(chrono::Utc::now()),
    }
}

fn role_strings(roles: &[MemberRole]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

#[async_trait]
impl CommunityRepository for CommunityStore {
    async fn create(&self, created_by: Uuid, new: NewCommunity) -> AppResult<Community> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now();

        let model = community::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name),
            description: Set(new.description),
            category: Set(new.category),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        member_row(model.id, created_by, MemberRole::Admin)
            .insert(&txn)
            .await?;

        txn.commit().await?;
        Ok(Community::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Community>> {
        let model = CommunityEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Community::from))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Community>> {
        let model = CommunityEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(community::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(&self.db)
            .await?;
        Ok(model.map(Community::from))
    }

    async fn list(
        &self,
        filter: CommunityFilter,
        params: PaginationParams,
    ) -> AppResult<(Vec<Community>, u64)> {
        let mut condition = Condition::all();
        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            condition = condition.add(
                Expr::expr(Func::lower(Expr::col(community::Column::Name))).like(pattern),
            );
        }
        if let Some(category) = filter.category.filter(|c| !c.trim().is_empty()) {
            condition = condition.add(community::Column::Category.eq(category.trim()));
        }

        let paginator = CommunityEntity::find()
            .filter(condition)
            .order_by_desc(community::Column::CreatedAt)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok((models.into_iter().map(Community::from).collect(), total))
    }

    async fn update(&self, id: Uuid, changes: CommunityChanges) -> AppResult<Community> {
        let mut active: community::ActiveModel = CommunityEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_missing("Community")?
            .into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(category) = changes.category {
            active.category = Set(category);
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Community::from(model))
    }

    async fn membership(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Membership>> {
        self.find_membership_model(community_id, user_id)
            .await?
            .map(Membership::try_from)
            .transpose()
    }

    async fn add_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> AppResult<Membership> {
        let model = member_row(community_id, user_id, role)
            .insert(&self.db)
            .await?;
        Membership::try_from(model)
    }

    async fn set_member_role(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> AppResult<Membership> {
        let mut active: community_member::ActiveModel = self
            .find_membership_model(community_id, user_id)
            .await?
            .ok_or_missing("Membership")?
            .into();
        active.role = Set(role.as_str().to_string());

        let model = active.update(&self.db).await?;
        Membership::try_from(model)
    }

    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = MemberEntity::delete_many()
            .filter(community_member::Column::CommunityId.eq(community_id))
            .filter(community_member::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn count_members(&self, community_id: Uuid) -> AppResult<u64> {
        let count = MemberEntity::find()
            .filter(community_member::Column::CommunityId.eq(community_id))
            .filter(community_member::Column::Role.ne(MemberRole::Banned.as_str()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_admins(&self, community_id: Uuid) -> AppResult<u64> {
        let count = MemberEntity::find()
            .filter(community_member::Column::CommunityId.eq(community_id))
            .filter(community_member::Column::Role.eq(MemberRole::Admin.as_str()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn list_members(&self, community_id: Uuid) -> AppResult<Vec<Member>> {
        let memberships = MemberEntity::find()
            .filter(community_member::Column::CommunityId.eq(community_id))
            .filter(community_member::Column::Role.ne(MemberRole::Banned.as_str()))
            .order_by_asc(community_member::Column::JoinedAt)
            .all(&self.db)
            .await?;

        let user_ids: Vec<Uuid> = memberships.iter().map(|m| m.user_id).collect();
        let names: HashMap<Uuid, String> = UserEntity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .filter(user::Column::DeletedAt.is_null())
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        // Soft-deleted accounts drop out of the listing
        memberships
            .into_iter()
            .filter_map(|m| {
                let name = names.get(&m.user_id)?.clone();
                Some((m, name))
            })
            .map(|(m, name)| {
                Ok(Member {
                    user_id: m.user_id,
                    name,
                    role: m.role.parse::<MemberRole>()?,
                    joined_at: m.joined_at,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()
    }

    async fn member_ids(&self, community_id: Uuid, roles: Vec<MemberRole>) -> AppResult<Vec<Uuid>> {
        let rows = MemberEntity::find()
            .filter(community_member::Column::CommunityId.eq(community_id))
            .filter(community_member::Column::Role.is_in(role_strings(&roles)))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }

    async fn membership_community_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows = MemberEntity::find()
            .filter(community_member::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.community_id).collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<UserCommunity>> {
        let rows = MemberEntity::find()
            .filter(community_member::Column::UserId.eq(user_id))
            .filter(community_member::Column::Role.ne(MemberRole::Banned.as_str()))
            .find_also_related(CommunityEntity)
            .order_by_desc(community_member::Column::JoinedAt)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .filter_map(|(membership, community)| community.map(|c| (membership, c)))
            .map(|(membership, community)| {
                Ok(UserCommunity {
                    community: Community::from(community),
                    role: membership.role.parse::<MemberRole>()?,
                    joined_at: membership.joined_at,
                })
            })
            .collect()
    }
}
