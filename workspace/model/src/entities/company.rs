use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use tracing::{debug, instrument};

use super::user;
use crate::error::ModelError;

pub const FIELD_MAX_LENGTH: u32 = 70;
pub const RATING_MIN: i32 = 0;
pub const RATING_MAX: i32 = 5;

/// Area of expertise a company offers its services in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(70))")]
pub enum ExpertiseField {
    #[sea_orm(string_value = "Air Conditioner")]
    AirConditioner,
    #[sea_orm(string_value = "All in One")]
    AllInOne,
    #[sea_orm(string_value = "Carpentry")]
    Carpentry,
    #[sea_orm(string_value = "Electricity")]
    Electricity,
    #[sea_orm(string_value = "Gardening")]
    Gardening,
    #[sea_orm(string_value = "Home Machines")]
    HomeMachines,
    #[sea_orm(string_value = "House Keeping")]
    HouseKeeping,
    #[sea_orm(string_value = "Interior Design")]
    InteriorDesign,
    #[sea_orm(string_value = "Locks")]
    Locks,
    #[sea_orm(string_value = "Painting")]
    Painting,
    #[sea_orm(string_value = "Plumbing")]
    Plumbing,
    #[sea_orm(string_value = "Water Heaters")]
    WaterHeaters,
}

impl ExpertiseField {
    /// Every category, in declaration order.
    pub const ALL: [ExpertiseField; 12] = [
        ExpertiseField::AirConditioner,
        ExpertiseField::AllInOne,
        ExpertiseField::Carpentry,
        ExpertiseField::Electricity,
        ExpertiseField::Gardening,
        ExpertiseField::HomeMachines,
        ExpertiseField::HouseKeeping,
        ExpertiseField::InteriorDesign,
        ExpertiseField::Locks,
        ExpertiseField::Painting,
        ExpertiseField::Plumbing,
        ExpertiseField::WaterHeaters,
    ];

    /// The value stored in the `field` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertiseField::AirConditioner => "Air Conditioner",
            ExpertiseField::AllInOne => "All in One",
            ExpertiseField::Carpentry => "Carpentry",
            ExpertiseField::Electricity => "Electricity",
            ExpertiseField::Gardening => "Gardening",
            ExpertiseField::HomeMachines => "Home Machines",
            ExpertiseField::HouseKeeping => "House Keeping",
            ExpertiseField::InteriorDesign => "Interior Design",
            ExpertiseField::Locks => "Locks",
            ExpertiseField::Painting => "Painting",
            ExpertiseField::Plumbing => "Plumbing",
            ExpertiseField::WaterHeaters => "Water Heaters",
        }
    }
}

impl fmt::Display for ExpertiseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpertiseField {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ModelError::RequiredFieldMissing { field: "field" });
        }
        ExpertiseField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ModelError::InvalidChoice {
                field: "field",
                value: s.to_string(),
            })
    }
}

/// A company profile. Keyed by the owning user, so each user has at most one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    pub field: ExpertiseField,
    /// 0 to 5 inclusive, 0 until rated.
    pub rating: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::UserId",
        to = "user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

/// Renders a company the way it is listed everywhere: `"{id} - {username}"`.
pub fn format_label(user_id: i32, username: &str) -> String {
    format!("{} - {}", user_id, username)
}

impl Model {
    /// Label of this company built from its loaded user.
    ///
    /// Fails with [`ModelError::DanglingReference`] when the user is missing
    /// or is not the one this company belongs to.
    pub fn label(&self, user: Option<&user::Model>) -> Result<String, ModelError> {
        match user {
            Some(user) if user.id == self.user_id => Ok(format_label(user.id, &user.username)),
            _ => Err(ModelError::DanglingReference {
                entity: "user",
                id: self.user_id,
            }),
        }
    }

    /// Loads the owning user and renders the label.
    #[instrument(skip(db))]
    pub async fn describe<C>(&self, db: &C) -> Result<String, ModelError>
    where
        C: ConnectionTrait,
    {
        let user = self.find_related(user::Entity).one(db).await?;
        debug!("Loaded user for company {}: {}", self.user_id, user.is_some());
        self.label(user.as_ref())
    }
}

impl ActiveModel {
    /// Column validators. Called on every save, and may be called earlier to
    /// check a record before touching the database.
    pub fn validate(&self) -> Result<(), ModelError> {
        if matches!(self.field, ActiveValue::NotSet) {
            return Err(ModelError::RequiredFieldMissing { field: "field" });
        }
        if let ActiveValue::Set(rating) | ActiveValue::Unchanged(rating) = &self.rating {
            check_rating(*rating)?;
        }
        Ok(())
    }
}

pub fn check_rating(rating: i32) -> Result<(), ModelError> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(ModelError::RangeValidation {
            field: "rating",
            value: rating.into(),
            min: RATING_MIN.into(),
            max: RATING_MAX.into(),
        });
    }
    Ok(())
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && matches!(self.rating, ActiveValue::NotSet) {
            self.rating = Set(RATING_MIN);
        }
        self.validate().map_err(ModelError::into_db_err)?;
        Ok(self)
    }
}
