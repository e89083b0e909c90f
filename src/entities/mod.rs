pub mod prelude;

pub mod api_keys;
pub mod encounters;
pub mod users;
