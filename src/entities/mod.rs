pub mod prelude;

pub mod admin_users;
pub mod blog_posts;
pub mod contact_requests;
