mod create_admin;

pub use create_admin::cmd_create_admin;
