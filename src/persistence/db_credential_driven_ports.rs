use crate::domain;
use crate::domain::auth::driven_ports::InsertAccountError;
use crate::domain::auth::{StoredCredentials, UserIdentity};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{query_as, FromRow};

/// SQLSTATE code PostgreSQL reports when a unique index rejects a write
const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: i32,
    email: String,
    name: String,
    password_hash: String,
}

impl From<AccountRow> for StoredCredentials {
    fn from(value: AccountRow) -> Self {
        StoredCredentials {
            user_id: value.id,
            email: value.email,
            name: value.name,
            password_hash: value.password_hash,
        }
    }
}

pub struct DbCredentialReader;

impl domain::auth::driven_ports::CredentialReader for DbCredentialReader {
    async fn credentials_for_email(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<StoredCredentials>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let account = query_as::<_, AccountRow>(
            "SELECT id, email, name, password_hash FROM app_user WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to look up an account by email")?
        .map(StoredCredentials::from);

        Ok(account)
    }
}

#[derive(FromRow)]
struct InsertedAccountRow {
    id: i32,
    email: String,
    name: String,
}

pub struct DbCredentialWriter;

impl domain::auth::driven_ports::CredentialWriter for DbCredentialWriter {
    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<UserIdentity, InsertAccountError> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let insert_result = query_as::<_, InsertedAccountRow>(
            "INSERT INTO app_user(email, name, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, email, name",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(cxn.borrow_connection())
        .await;

        let inserted_account = match insert_result {
            Ok(row) => row,
            Err(insert_err) if is_unique_violation(&insert_err) => {
                return Err(InsertAccountError::DuplicateEmail);
            }
            Err(insert_err) => {
                return Err(Error::new(insert_err)
                    .context("trying to insert a new account into the database")
                    .into());
            }
        };

        Ok(UserIdentity {
            id: inserted_account.id,
            email: inserted_account.email,
            name: inserted_account.name,
        })
    }
}
