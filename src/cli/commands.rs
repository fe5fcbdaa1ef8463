pub mod companies;
pub mod customers;
pub mod import_django;
pub mod initdb;
pub mod users;

pub use import_django::import_django;
pub use initdb::init_database;

use anyhow::Result;
use model::auth::AuthBase;
use model::entities::user::NewUser;

use super::AccountArgs;

impl AccountArgs {
    /// Builds the account input, hashing the password when one was given.
    pub fn into_new_user(self) -> Result<NewUser> {
        let mut auth = AuthBase::new(self.username).with_names(self.first_name, self.last_name);
        if let Some(password) = self.password.as_deref() {
            auth.set_password(password)?;
        }
        Ok(NewUser::new(auth, self.email))
    }
}
