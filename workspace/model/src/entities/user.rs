use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use validator::Validate;

use crate::auth::AuthBase;
use crate::error::ModelError;

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 100;

/// Represents an account of the marketplace.
/// Authentication columns come first, followed by the role flags and the
/// unique email.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(default_value = "false")]
    pub is_staff: bool,
    #[sea_orm(default_value = "false")]
    pub is_superuser: bool,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub date_joined: DateTimeUtc,
    pub last_login: Option<DateTimeUtc>,
    /// Set when the account registered as a company.
    #[sea_orm(default_value = "false")]
    pub is_company: bool,
    /// Set when the account registered as a customer. Independent of `is_company`.
    #[sea_orm(default_value = "false")]
    pub is_customer: bool,
    #[sea_orm(unique)]
    pub email: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user owns at most one company profile.
    #[sea_orm(has_one = "super::company::Entity")]
    Company,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Model {
    /// The authentication part of this account.
    pub fn auth(&self) -> AuthBase {
        AuthBase {
            username: self.username.clone(),
            password: self.password.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            is_active: self.is_active,
        }
    }

    pub fn check_password(&self, raw: &str) -> bool {
        crate::auth::verify_password(raw, &self.password)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    pub auth: AuthBase,
    #[validate(length(min = 1, max = 100))]
    pub email: String,
    pub is_company: bool,
    pub is_customer: bool,
}

impl NewUser {
    pub fn new(auth: AuthBase, email: impl Into<String>) -> Self {
        Self {
            auth,
            email: email.into(),
            is_company: false,
            is_customer: false,
        }
    }

    /// Runs the validators of both the embedded auth fields and this struct.
    pub fn check(&self) -> Result<(), ModelError> {
        self.auth.validate()?;
        self.validate()?;
        Ok(())
    }

    pub fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            username: Set(self.auth.username),
            password: Set(self.auth.password),
            first_name: Set(self.auth.first_name),
            last_name: Set(self.auth.last_name),
            is_staff: Set(self.auth.is_staff),
            is_superuser: Set(self.auth.is_superuser),
            is_active: Set(self.auth.is_active),
            date_joined: Set(Utc::now()),
            last_login: Set(None),
            is_company: Set(self.is_company),
            is_customer: Set(self.is_customer),
            email: Set(self.email),
            ..Default::default()
        }
    }
}

/// Partial profile update. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub is_company: Option<bool>,
    pub is_customer: Option<bool>,
    pub is_active: Option<bool>,
}

impl ProfileUpdate {
    pub fn apply(self, active: &mut ActiveModel) {
        if let Some(email) = self.email {
            active.email = Set(email);
        }
        if let Some(first_name) = self.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = self.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(is_company) = self.is_company {
            active.is_company = Set(is_company);
        }
        if let Some(is_customer) = self.is_customer {
            active.is_customer = Set(is_customer);
        }
        if let Some(is_active) = self.is_active {
            active.is_active = Set(is_active);
        }
    }
}

fn check_length(
    field: &'static str,
    value: &ActiveValue<String>,
    min: usize,
    max: usize,
) -> Result<(), ModelError> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => {
            let len = v.chars().count();
            if len < min || len > max {
                return Err(ModelError::Length { field, min, max });
            }
            Ok(())
        }
        ActiveValue::NotSet => Ok(()),
    }
}

impl ActiveModel {
    /// Column validators, run before every save.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_length("username", &self.username, 1, USERNAME_MAX_LENGTH)?;
        check_length("first_name", &self.first_name, 0, NAME_MAX_LENGTH)?;
        check_length("last_name", &self.last_name, 0, NAME_MAX_LENGTH)?;
        check_length("email", &self.email, 1, EMAIL_MAX_LENGTH)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            if matches!(self.date_joined, ActiveValue::NotSet) {
                self.date_joined = Set(Utc::now());
            }
            if matches!(self.email, ActiveValue::NotSet) {
                return Err(ModelError::RequiredFieldMissing { field: "email" }.into_db_err());
            }
        }
        self.validate().map_err(ModelError::into_db_err)?;
        Ok(self)
    }
}
