use anyhow::bail;
use std::sync::Arc;

use crate::api::validation::{validate_email, validate_password, validate_username};
use crate::auth::PasswordEncoder;
use crate::config::Config;
use crate::db::Store;
use crate::entities::users::UserType;

/// Create an ADMIN account that can log in right away, for when the seeded
/// credentials were removed or rotated away.
pub async fn cmd_create_admin(
    config: &Config,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let email = validate_email(email)?;
    let username = validate_username(username)?;
    validate_password(password)?;

    let store = Store::new(&config.general.database_path).await?;

    if store.get_user_by_email(&email).await?.is_some() {
        bail!("email '{email}' is already in use");
    }
    if store.get_user_by_username(&username).await?.is_some() {
        bail!("username '{username}' is already in use");
    }

    let encoder = Arc::new(PasswordEncoder::new(&config.security)?);
    let password_hash = encoder.hash_async(password.to_string()).await?;

    let user = store.insert_user(&username, &email, &password_hash).await?;
    store.set_user_type(user.id, UserType::Admin).await?;
    store.enable_user(user.id).await?;

    println!("✓ Admin account '{username}' created (id {})", user.id);
    Ok(())
}
