use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use model::auth::{AuthBase, UNUSABLE_PASSWORD_PREFIX};
use model::entities::user::NewUser;
use model::store;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set, TransactionTrait};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// One record of a `manage.py dumpdata` JSON file
#[derive(Debug, Deserialize)]
struct DjangoRecord {
    model: String,
    pk: i32,
    #[serde(default)]
    fields: serde_json::Value,
}

/// Django `users.User` fields
#[derive(Debug, Deserialize)]
struct DjangoUser {
    username: String,
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    is_staff: bool,
    #[serde(default)]
    is_superuser: bool,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    is_company: bool,
    #[serde(default)]
    is_customer: bool,
    date_joined: Option<String>,
    last_login: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Django `users.Company` fields; the record pk is the user pk
#[derive(Debug, Deserialize)]
struct DjangoCompany {
    field: Option<String>,
    rating: Option<i32>,
}

/// Counts of imported records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub users: usize,
    pub customers: usize,
    pub companies: usize,
    pub skipped: usize,
}

/// Parses Django datetimes, with or without an offset. Naive values are UTC.
fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("Invalid datetime: {}", value))?;
    Ok(naive.and_utc())
}

/// Django stores `<algorithm>$<hash>`. Only argon2 hashes can be checked
/// here, kept as their PHC string; everything else must be reset.
fn import_password(hash: &str) -> String {
    if let Some(phc) = hash.strip_prefix("argon2").filter(|rest| rest.starts_with("$argon2")) {
        phc.to_string()
    } else {
        format!("{}{}", UNUSABLE_PASSWORD_PREFIX, hash.split('$').next().unwrap_or_default())
    }
}

pub async fn import_django(db: &DatabaseConnection, json_path: &str) -> Result<ImportSummary> {
    trace!("Entering import_django function");
    info!("Starting Django data import");
    debug!("JSON path: {}", json_path);

    let path = Path::new(json_path);
    let file = File::open(path).with_context(|| format!("Failed to open file: {}", json_path))?;

    info!("Parsing JSON data...");
    let records: Vec<DjangoRecord> =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse JSON")?;
    info!("Loaded {} records from Django dump", records.len());

    let txn = db.begin().await?;
    let mut summary = ImportSummary::default();
    let mut user_map: HashMap<i32, i32> = HashMap::new();

    // First pass: users
    info!("Importing users...");
    for record in records.iter().filter(|r| r.model == "users.user") {
        let django_user: DjangoUser = serde_json::from_value(record.fields.clone())
            .with_context(|| format!("Invalid user record {}", record.pk))?;

        let mut auth = AuthBase::new(django_user.username.clone())
            .with_names(django_user.first_name, django_user.last_name);
        auth.password = import_password(&django_user.password);
        auth.is_staff = django_user.is_staff;
        auth.is_superuser = django_user.is_superuser;
        auth.is_active = django_user.is_active;

        let mut new_user = NewUser::new(auth, django_user.email);
        new_user.is_company = django_user.is_company;
        new_user.is_customer = django_user.is_customer;

        let created = store::create_user(&txn, new_user)
            .await
            .with_context(|| format!("Failed to import user '{}'", django_user.username))?;

        // Keep the original timestamps
        if django_user.date_joined.is_some() || django_user.last_login.is_some() {
            let mut active = created.clone().into_active_model();
            if let Some(joined) = django_user.date_joined.as_deref() {
                active.date_joined = Set(parse_datetime(joined)?);
            }
            if let Some(login) = django_user.last_login.as_deref() {
                active.last_login = Set(Some(parse_datetime(login)?));
            }
            active.update(&txn).await?;
        }

        user_map.insert(record.pk, created.id);
        summary.users += 1;
        debug!("Imported user {} -> ID {}", django_user.username, created.id);
    }
    info!("Imported {} users", summary.users);

    // Second pass: customers
    for record in records.iter().filter(|r| r.model == "users.customer") {
        let created = store::create_customer(&txn).await?;
        summary.customers += 1;
        debug!("Imported customer {} -> ID {}", record.pk, created.id);
    }
    info!("Imported {} customers", summary.customers);

    // Third pass: companies, keyed by their user
    info!("Importing companies...");
    for record in records.iter().filter(|r| r.model == "users.company") {
        let django_company: DjangoCompany = serde_json::from_value(record.fields.clone())
            .with_context(|| format!("Invalid company record {}", record.pk))?;
        let Some(&user_id) = user_map.get(&record.pk) else {
            bail!("Company {} references a user missing from the dump", record.pk);
        };

        let created = store::create_company_from_str(
            &txn,
            user_id,
            django_company.field.as_deref(),
            django_company.rating,
        )
        .await
        .with_context(|| format!("Failed to import company {}", record.pk))?;
        summary.companies += 1;
        debug!("Imported company {} -> user ID {}", record.pk, created.user_id);
    }
    info!("Imported {} companies", summary.companies);

    summary.skipped = records
        .iter()
        .filter(|r| !matches!(r.model.as_str(), "users.user" | "users.customer" | "users.company"))
        .count();
    if summary.skipped > 0 {
        warn!("Skipped {} records of other models", summary.skipped);
    }

    txn.commit().await?;
    info!("Django data import completed: {:?}", summary);
    Ok(summary)
}
