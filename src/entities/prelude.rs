pub use super::admin_users::Entity as AdminUsers;
pub use super::blog_posts::Entity as BlogPosts;
pub use super::contact_requests::Entity as ContactRequests;
