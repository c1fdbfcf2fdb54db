//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database, JobQueue, LanguageModel};
use crate::services::{
    AssistantService, AuthService, BadgeService, CommunityService, EventService,
    NotificationService, PostService, ReportService, ReputationService, ServiceContainer,
    Services, UserService,
};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub reputation_service: Arc<dyn ReputationService>,
    pub notification_service: Arc<dyn NotificationService>,
    pub community_service: Arc<dyn CommunityService>,
    pub post_service: Arc<dyn PostService>,
    pub event_service: Arc<dyn EventService>,
    pub report_service: Arc<dyn ReportService>,
    pub badge_service: Arc<dyn BadgeService>,
    pub assistant_service: Arc<dyn AssistantService>,
    /// Redis cache (rate limits, badge catalog)
    pub cache: Arc<Cache>,
    /// Database connection
    pub database: Arc<Database>,
}

impl AppState {
    /// Wire every service over the shared database connection.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<Cache>,
        config: Config,
        model: Option<Arc<dyn LanguageModel>>,
        queue: Option<Arc<dyn JobQueue>>,
    ) -> Self {
        let services = Services::from_connection(database.get_connection(), config, model, queue);
        Self::from_container(&services, cache, database)
    }

    /// Build state from any container, e.g. a mocked one.
    pub fn from_container(
        services: &dyn ServiceContainer,
        cache: Arc<Cache>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            reputation_service: services.reputation(),
            notification_service: services.notifications(),
            community_service: services.communities(),
            post_service: services.posts(),
            event_service: services.events(),
            report_service: services.reports(),
            badge_service: services.badges(),
            assistant_service: services.assistant(),
            cache,
            database,
        }
    }
}
