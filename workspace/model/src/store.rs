//! Data-access functions. Every function takes the database handle
//! explicitly; nothing here keeps connection state of its own.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};
use validator::Validate;

use crate::entities::company::{self, ExpertiseField};
use crate::entities::{customer, user};
use crate::error::{ModelError, Result};

// ===================== Users =====================

/// Inserts a new account.
#[instrument(skip(db, new_user), fields(username = %new_user.auth.username))]
pub async fn create_user<C>(db: &C, new_user: user::NewUser) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    trace!("Entering create_user function");
    new_user.check()?;

    let username = new_user.auth.username.clone();
    let email = new_user.email.clone();
    let active = new_user.into_active_model();
    active.validate()?;

    match active.insert(db).await {
        Ok(model) => {
            info!("User created with ID: {}, username: {}", model.id, model.username);
            Ok(model)
        }
        Err(db_error) => {
            warn!("Failed to create user '{}': {}", username, db_error);
            Err(ModelError::from_write(
                db_error,
                &[("email", &email), ("username", &username)],
            ))
        }
    }
}

pub async fn find_user<C>(db: &C, user_id: i32) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    Ok(user::Entity::find_by_id(user_id).one(db).await?)
}

pub async fn get_user<C>(db: &C, user_id: i32) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    find_user(db, user_id)
        .await?
        .ok_or(ModelError::NotFound {
            entity: "user",
            id: user_id,
        })
}

pub async fn find_user_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Applies a partial profile update and returns the stored row.
#[instrument(skip(db, update))]
pub async fn update_profile<C>(
    db: &C,
    user_id: i32,
    update: user::ProfileUpdate,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    update.validate()?;
    let existing = get_user(db, user_id).await?;
    let email = update.email.clone();

    let mut active = existing.into_active_model();
    update.apply(&mut active);
    active.validate()?;

    let updated = active.update(db).await.map_err(|e| {
        warn!("Failed to update user {}: {}", user_id, e);
        ModelError::from_write(e, &[("email", email.as_deref().unwrap_or_default())])
    })?;
    debug!("Updated profile of user {}", user_id);
    Ok(updated)
}

/// Deletes an account. The database removes its company profile with it.
/// Returns whether a row was deleted.
#[instrument(skip(db))]
pub async fn delete_user<C>(db: &C, user_id: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = user::Entity::delete_by_id(user_id).exec(db).await?;
    if result.rows_affected == 0 {
        warn!("User {} not found for deletion", user_id);
        return Ok(false);
    }
    info!("Deleted user {}", user_id);
    Ok(true)
}

/// Checks a username/password pair. Inactive accounts never authenticate.
/// On success `last_login` is stamped and the refreshed row returned.
#[instrument(skip(db, raw_password))]
pub async fn authenticate<C>(
    db: &C,
    username: &str,
    raw_password: &str,
) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    let found = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;

    let Some(found) = found else {
        debug!("No user named {}", username);
        return Ok(None);
    };
    if !found.is_active || !found.check_password(raw_password) {
        debug!("Rejected credentials for {}", username);
        return Ok(None);
    }

    let mut active = found.into_active_model();
    active.last_login = Set(Some(Utc::now()));
    Ok(Some(active.update(db).await?))
}

// ===================== Customers =====================

pub async fn create_customer<C>(db: &C) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    let model = customer::ActiveModel {
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!("Customer created with ID: {}", model.id);
    Ok(model)
}

pub async fn find_customer<C>(db: &C, customer_id: i32) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Ok(customer::Entity::find_by_id(customer_id).one(db).await?)
}

pub async fn delete_customer<C>(db: &C, customer_id: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = customer::Entity::delete_by_id(customer_id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Creates an account flagged as a customer together with a customer record.
#[instrument(skip(db, new_user), fields(username = %new_user.auth.username))]
pub async fn register_customer<C>(
    db: &C,
    mut new_user: user::NewUser,
) -> Result<(user::Model, customer::Model)>
where
    C: ConnectionTrait + TransactionTrait,
{
    new_user.is_customer = true;

    let txn = db.begin().await?;
    let account = create_user(&txn, new_user).await?;
    let customer = create_customer(&txn).await?;
    txn.commit().await?;

    info!("Registered customer {} for user {}", customer.id, account.id);
    Ok((account, customer))
}

// ===================== Companies =====================

/// Creates the company profile of an existing user. `rating` defaults to 0.
#[instrument(skip(db))]
pub async fn create_company<C>(
    db: &C,
    user_id: i32,
    field: ExpertiseField,
    rating: Option<i32>,
) -> Result<company::Model>
where
    C: ConnectionTrait,
{
    let owner = get_user(db, user_id).await?;

    let mut active = company::ActiveModel {
        user_id: Set(owner.id),
        field: Set(field),
        ..Default::default()
    };
    if let Some(rating) = rating {
        active.rating = Set(rating);
    }
    active.validate()?;

    let model = active.insert(db).await.map_err(|e| {
        warn!("Failed to create company for user {}: {}", user_id, e);
        ModelError::from_write(e, &[("user_id", &user_id.to_string())])
    })?;
    info!("Company created for user {} ({})", model.user_id, model.field);
    Ok(model)
}

/// Like [`create_company`] but takes the category as it is stored, for
/// callers holding unvalidated text.
pub async fn create_company_from_str<C>(
    db: &C,
    user_id: i32,
    field: Option<&str>,
    rating: Option<i32>,
) -> Result<company::Model>
where
    C: ConnectionTrait,
{
    let field = field
        .ok_or(ModelError::RequiredFieldMissing { field: "field" })?
        .parse::<ExpertiseField>()?;
    create_company(db, user_id, field, rating).await
}

pub async fn find_company<C>(db: &C, user_id: i32) -> Result<Option<company::Model>>
where
    C: ConnectionTrait,
{
    Ok(company::Entity::find_by_id(user_id).one(db).await?)
}

pub async fn get_company<C>(db: &C, user_id: i32) -> Result<company::Model>
where
    C: ConnectionTrait,
{
    find_company(db, user_id)
        .await?
        .ok_or(ModelError::NotFound {
            entity: "company",
            id: user_id,
        })
}

/// Company together with its loaded owner.
pub async fn find_company_with_user<C>(
    db: &C,
    user_id: i32,
) -> Result<Option<(company::Model, Option<user::Model>)>>
where
    C: ConnectionTrait,
{
    Ok(company::Entity::find_by_id(user_id)
        .find_also_related(user::Entity)
        .one(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn set_rating<C>(db: &C, user_id: i32, rating: i32) -> Result<company::Model>
where
    C: ConnectionTrait,
{
    let mut active = get_company(db, user_id).await?.into_active_model();
    active.rating = Set(rating);
    active.validate()?;
    let updated = active.update(db).await?;
    info!("Rating of company {} set to {}", user_id, updated.rating);
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn set_field<C>(db: &C, user_id: i32, field: ExpertiseField) -> Result<company::Model>
where
    C: ConnectionTrait,
{
    let mut active = get_company(db, user_id).await?.into_active_model();
    active.field = Set(field);
    Ok(active.update(db).await?)
}

/// Lists companies, best rated first, optionally limited to one category.
pub async fn list_companies<C>(
    db: &C,
    field: Option<ExpertiseField>,
) -> Result<Vec<(company::Model, Option<user::Model>)>>
where
    C: ConnectionTrait,
{
    let mut query = company::Entity::find();
    if let Some(field) = field {
        query = query.filter(company::Column::Field.eq(field));
    }
    let companies = query
        .order_by_desc(company::Column::Rating)
        .order_by_asc(company::Column::UserId)
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    debug!("Listed {} companies", companies.len());
    Ok(companies)
}

/// Renders `"{user.id} - {user.username}"` for the company of `user_id`.
pub async fn company_label<C>(db: &C, user_id: i32) -> Result<String>
where
    C: ConnectionTrait,
{
    let company = get_company(db, user_id).await?;
    company.describe(db).await
}

pub async fn delete_company<C>(db: &C, user_id: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    match find_company(db, user_id).await? {
        Some(company) => {
            company.delete(db).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Creates an account flagged as a company together with its company
/// profile, atomically.
#[instrument(skip(db, new_user), fields(username = %new_user.auth.username))]
pub async fn register_company<C>(
    db: &C,
    mut new_user: user::NewUser,
    field: ExpertiseField,
) -> Result<(user::Model, company::Model)>
where
    C: ConnectionTrait + TransactionTrait,
{
    new_user.is_company = true;

    let txn = db.begin().await?;
    let account = create_user(&txn, new_user).await?;
    let profile = create_company(&txn, account.id, field, None).await?;
    txn.commit().await?;

    info!("Registered company {}", profile.label(Some(&account))?);
    Ok((account, profile))
}
