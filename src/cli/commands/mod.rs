mod admin;
mod login;

pub use admin::{cmd_seed_admin, cmd_set_admin_active, cmd_set_admin_password};
pub use login::cmd_login;
