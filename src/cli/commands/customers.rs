use anyhow::{Context, Result};
use model::entities::{customer, user};
use model::store;
use sea_orm::DatabaseConnection;
use tracing::trace;

use crate::cli::AccountArgs;

pub async fn register_customer(
    db: &DatabaseConnection,
    account: AccountArgs,
) -> Result<(user::Model, customer::Model)> {
    trace!("Entering register_customer command");
    let username = account.username.clone();
    let (created, customer) = store::register_customer(db, account.into_new_user()?)
        .await
        .with_context(|| format!("Failed to register customer '{}'", username))?;
    println!(
        "Registered customer {} for user {} ({})",
        customer.id, created.id, created.username
    );
    Ok((created, customer))
}
