use crate::domain::auth::driven_ports::{CredentialReader, CredentialWriter, InsertAccountError};
use crate::domain::auth::driving_ports::{AuthenticateError, RegisterError};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use tokio::task;

/// A signed-in (or newly registered) user, minus anything password-related
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i32,
    pub email: String,
    pub name: String,
}

/// Registration data with the password still in the clear. The password never makes it
/// past [AuthService::register], which only hands a bcrypt hash to the driven port.
#[cfg_attr(test, derive(Clone))]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Everything needed to check a sign-in attempt against one account
pub struct StoredCredentials {
    pub user_id: i32,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum InsertAccountError {
        #[error("an account with that email already exists")]
        DuplicateEmail,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    pub trait CredentialReader {
        /// Looks up the account registered under the given email, if there is one
        async fn credentials_for_email(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<StoredCredentials>, anyhow::Error>;
    }

    pub trait CredentialWriter {
        /// Persists a new account. Email uniqueness is enforced here rather than via a
        /// read-then-write in the service so two racing registrations can't both win.
        async fn insert_account(
            &self,
            email: &str,
            password_hash: &str,
            name: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<UserIdentity, InsertAccountError>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum RegisterError {
        #[error("that email address is already registered")]
        EmailInUse,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    /// Deliberately doesn't say whether the email or the password was the problem
    #[derive(Debug, Error)]
    pub enum AuthenticateError {
        #[error("the email or password was incorrect")]
        BadCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait AuthPort {
        async fn register(
            &self,
            new_account: &NewAccount,
            ext_cxn: &mut impl ExternalConnectivity,
            cred_write: &impl driven_ports::CredentialWriter,
        ) -> Result<UserIdentity, RegisterError>;
        async fn authenticate(
            &self,
            email: &str,
            password: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            cred_read: &impl driven_ports::CredentialReader,
        ) -> Result<UserIdentity, AuthenticateError>;
    }
}

/// Handles account registration and sign-in. Password hashing runs on the blocking
/// thread pool since a bcrypt round at production cost takes long enough to stall the
/// async executor.
pub struct AuthService {
    pub hash_cost: u32,
}

impl driving_ports::AuthPort for AuthService {
    async fn register(
        &self,
        new_account: &NewAccount,
        ext_cxn: &mut impl ExternalConnectivity,
        cred_write: &impl CredentialWriter,
    ) -> Result<UserIdentity, RegisterError> {
        let password = new_account.password.clone();
        let hash_cost = self.hash_cost;
        let password_hash = task::spawn_blocking(move || bcrypt::hash(password, hash_cost))
            .await
            .context("waiting for the password hashing task")?
            .context("hashing a new account's password")?;

        let identity = cred_write
            .insert_account(
                &new_account.email,
                &password_hash,
                &new_account.name,
                &mut *ext_cxn,
            )
            .await
            .map_err(|err| match err {
                InsertAccountError::DuplicateEmail => RegisterError::EmailInUse,
                InsertAccountError::PortError(port_err) => {
                    RegisterError::PortError(port_err.context("registering a new account"))
                }
            })?;

        Ok(identity)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        cred_read: &impl CredentialReader,
    ) -> Result<UserIdentity, AuthenticateError> {
        let maybe_credentials = cred_read
            .credentials_for_email(email, &mut *ext_cxn)
            .await
            .context("looking up credentials for sign-in")?;
        let Some(credentials) = maybe_credentials else {
            return Err(AuthenticateError::BadCredentials);
        };

        let StoredCredentials {
            user_id,
            email: stored_email,
            name,
            password_hash,
        } = credentials;
        let submitted_password = password.to_owned();
        let password_matches =
            task::spawn_blocking(move || bcrypt::verify(submitted_password, &password_hash))
                .await
                .context("waiting for the password check task")?
                .context("checking a password against the stored hash")?;

        if !password_matches {
            return Err(AuthenticateError::BadCredentials);
        }

        Ok(UserIdentity {
            id: user_id,
            email: stored_email,
            name,
        })
    }
}

/// Cheap hashing parameter for tests. Production cost makes each test spend ~100ms
/// per hash, which adds up fast across the suite.
#[cfg(test)]
const TEST_HASH_COST: u32 = 4;
