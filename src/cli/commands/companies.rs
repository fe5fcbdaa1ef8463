use anyhow::{Context, Result};
use model::entities::company::{self, ExpertiseField};
use model::entities::user;
use model::store;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, trace};

use crate::cli::AccountArgs;

/// A company as printed by the CLI.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompanyView {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub field: String,
    pub rating: i32,
    pub label: String,
}

impl CompanyView {
    fn build(company: company::Model, owner: Option<user::Model>) -> Result<Self> {
        let label = company.label(owner.as_ref())?;
        // label() only succeeds with the owner loaded
        let owner = owner.context("company owner missing")?;
        Ok(Self {
            user_id: company.user_id,
            username: owner.username,
            email: owner.email,
            field: company.field.to_string(),
            rating: company.rating,
            label,
        })
    }
}

pub fn list_fields() {
    for field in ExpertiseField::ALL {
        println!("{}", field);
    }
}

pub async fn register_company(
    db: &DatabaseConnection,
    account: AccountArgs,
    field: &str,
) -> Result<CompanyView> {
    trace!("Entering register_company command");
    let field: ExpertiseField = field.parse()?;
    let username = account.username.clone();

    let (owner, profile) = store::register_company(db, account.into_new_user()?, field)
        .await
        .with_context(|| format!("Failed to register company '{}'", username))?;
    let view = CompanyView::build(profile, Some(owner))?;
    println!("Registered company {}", view.label);
    Ok(view)
}

pub async fn show_company(db: &DatabaseConnection, user_id: i32) -> Result<CompanyView> {
    let (profile, owner) = store::find_company_with_user(db, user_id)
        .await?
        .with_context(|| format!("No company for user {}", user_id))?;
    CompanyView::build(profile, owner)
}

pub async fn list_companies(
    db: &DatabaseConnection,
    field: Option<&str>,
) -> Result<Vec<CompanyView>> {
    let field = field.map(str::parse::<ExpertiseField>).transpose()?;
    let rows = store::list_companies(db, field).await?;
    debug!("Building {} company views", rows.len());
    rows.into_iter()
        .map(|(profile, owner)| CompanyView::build(profile, owner))
        .collect()
}

pub async fn set_rating(
    db: &DatabaseConnection,
    user_id: i32,
    rating: i32,
) -> Result<company::Model> {
    let updated = store::set_rating(db, user_id, rating)
        .await
        .with_context(|| format!("Failed to rate company {}", user_id))?;
    println!("Company {} rated {}", user_id, updated.rating);
    Ok(updated)
}

pub fn render_views(views: &[CompanyView], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(views)?);
    }
    Ok(views
        .iter()
        .map(|v| format!("{:<30} {:<16} {}/5", v.label, v.field, v.rating))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn print_views(views: &[CompanyView], json: bool) -> Result<()> {
    if views.is_empty() && !json {
        println!("No companies");
        return Ok(());
    }
    println!("{}", render_views(views, json)?);
    Ok(())
}
