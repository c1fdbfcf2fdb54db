//! Community post repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::post::{self, Entity as PostEntity};
use crate::domain::Post;
use crate::errors::AppResult;
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, community_id: Uuid, author_id: Uuid, content: String) -> AppResult<Post>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Post>>;

    /// Newest first, with the unpaginated total
    async fn list_by_community(
        &self,
        community_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<(Vec<Post>, u64)>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

pub struct PostStore {
    db: DatabaseConnection,
}

impl PostStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for PostStore {
    async fn create(&self, community_id: Uuid, author_id: Uuid, content: String) -> AppResult<Post> {
        let now = chrono::Utc::now();
        let model = post::ActiveModel {
            id: Set(Uuid::new_v4()),
            community_id: Set(community_id),
            author_id: Set(author_id),
            content: Set(content),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(Post::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Post>> {
        let model = PostEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Post::from))
    }

    async fn list_by_community(
        &self,
        community_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<(Vec<Post>, u64)> {
        let paginator = PostEntity::find()
            .filter(post::Column::CommunityId.eq(community_id))
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok((models.into_iter().map(Post::from).collect(), total))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = PostEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
