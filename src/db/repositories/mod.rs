pub mod admin_user;
pub mod blog;
pub mod contact;
