use anyhow::{Context, Result};
use model::entities::user;
use model::store;
use sea_orm::DatabaseConnection;
use tracing::{info, trace, warn};

use crate::cli::AccountArgs;

pub async fn create_user(
    db: &DatabaseConnection,
    account: AccountArgs,
    is_company: bool,
    is_customer: bool,
) -> Result<user::Model> {
    trace!("Entering create_user command");
    let username = account.username.clone();
    let mut new_user = account.into_new_user()?;
    new_user.is_company = is_company;
    new_user.is_customer = is_customer;

    let created = store::create_user(db, new_user)
        .await
        .with_context(|| format!("Failed to create user '{}'", username))?;
    println!("Created user {} ({})", created.id, created.username);
    Ok(created)
}

pub async fn update_user(
    db: &DatabaseConnection,
    user_id: i32,
    update: user::ProfileUpdate,
) -> Result<user::Model> {
    let updated = store::update_profile(db, user_id, update)
        .await
        .with_context(|| format!("Failed to update user {}", user_id))?;
    println!(
        "Updated user {} ({}): email={}, company={}, customer={}",
        updated.id, updated.username, updated.email, updated.is_company, updated.is_customer
    );
    Ok(updated)
}

pub async fn delete_user(db: &DatabaseConnection, user_id: i32) -> Result<bool> {
    let deleted = store::delete_user(db, user_id).await?;
    if deleted {
        info!("User {} and dependent records removed", user_id);
        println!("Deleted user {}", user_id);
    } else {
        warn!("Nothing to delete for user {}", user_id);
        println!("User {} not found", user_id);
    }
    Ok(deleted)
}
