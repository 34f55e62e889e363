//! The authentication path: registration and login over a [`UserStore`], using the salted hashes from
//! [`credentials`](crate::credentials).
use fieldx::fxstruct;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;
use tracing::instrument;

use crate::credentials::hash_password;
use crate::credentials::verify_password;
use crate::error::AccountError;
use crate::traits::EventPublisher;
use crate::traits::UserStore;
use crate::types::DomainEvent;
use crate::types::Registration;
use crate::types::UserAccount;

#[fxstruct(
    no_new,
    default(off),
    builder(
        doc("Builder object of [`Accounts`].", "", "See [`Accounts::builder()`] method."),
        method_doc("Implement builder pattern for [`Accounts`]."),
    )
)]
pub struct Accounts<U>
where
    U: UserStore,
{
    #[fieldx(get(clone))]
    store: Arc<U>,

    /// Announces every successful registration.
    #[fieldx(optional)]
    publisher: Arc<dyn EventPublisher>,
}

impl<U> Accounts<U>
where
    U: UserStore,
{
    /// Register a new user. `None` if the email is already taken or the store declined the account.
    #[instrument(level = "trace", skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<Option<UserAccount>, AccountError> {
        if self
            .store
            .find_by_email(&registration.email)
            .await
            .map_err(|err| AccountError::store("look up user", err))?
            .is_some()
        {
            debug!("email already registered");
            return Ok(None);
        }

        let account = UserAccount {
            id:            0,
            first_name:    registration.first_name,
            last_name:     registration.last_name,
            email:         registration.email,
            password_hash: hash_password(&registration.password),
            role:          registration.role,
        };

        let Some(account) = self
            .store
            .insert(account)
            .await
            .map_err(|err| AccountError::store("insert user", err))?
        else {
            return Ok(None);
        };

        if let Some(publisher) = self.publisher.as_ref() {
            publisher.publish(DomainEvent::UserRegistered {
                first_name: account.first_name.clone(),
                last_name:  account.last_name.clone(),
                email:      account.email.clone(),
            });
        }

        Ok(Some(account))
    }

    /// The account if `password` matches. Unknown emails and wrong passwords are indistinguishable to the caller.
    #[instrument(level = "trace", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<UserAccount>, AccountError> {
        let account = self
            .store
            .find_by_email(email)
            .await
            .map_err(|err| AccountError::store("look up user", err))?;
        Ok(account.filter(|account| verify_password(password, &account.password_hash)))
    }

    /// Replace the password after verifying the current one. `false` if the email is unknown or `current` is wrong.
    #[instrument(level = "trace", skip(self, current, new))]
    pub async fn change_password(&self, email: &str, current: &str, new: &str) -> Result<bool, AccountError> {
        let Some(account) = self.login(email, current).await?
        else {
            return Ok(false);
        };
        self.store
            .update_password(account.id, hash_password(new))
            .await
            .map_err(|err| AccountError::store("update password", err))
    }
}

impl<U> Debug for Accounts<U>
where
    U: UserStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accounts")
            .field("publisher", &self.publisher.is_some())
            .finish_non_exhaustive()
    }
}
