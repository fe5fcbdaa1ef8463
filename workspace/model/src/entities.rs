//! Root of the SeaORM entity modules for the household-services marketplace.

pub mod company;
pub mod customer;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::company::Entity as Company;
    pub use super::company::ExpertiseField;
    pub use super::customer::Entity as Customer;
    pub use super::user::Entity as User;
}
