//! Shared request/response types.

mod pagination;
mod response;

pub use pagination::{
    Paginated, PaginatedCommunities, PaginatedNotifications, PaginatedPosts, PaginatedReports,
    PaginationMeta, PaginationParams,
};
pub use response::{Created, MessageResponse, NoContent};
