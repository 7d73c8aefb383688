use crate::domain;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for registering a new account via the API. The [Display] impl leaves the
/// password out so the struct can be logged.
#[derive(Deserialize, Serialize, Display, Validate, ToSchema)]
#[display("{name} <{email}>")]
pub struct Signup {
    #[validate(email)]
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    /// bcrypt only reads the first 72 bytes of input, so longer passwords would
    /// silently lose entropy
    #[validate(length(min = 8, max = 72))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "John Doe")]
    pub name: String,
}

impl From<Signup> for domain::auth::NewAccount {
    fn from(value: Signup) -> Self {
        domain::auth::NewAccount {
            email: value.email,
            password: value.password,
            name: value.name,
        }
    }
}

/// DTO for signing in via the API. Not validated beyond its shape; anything that
/// doesn't match a registered account gets the same credential rejection.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct Login {
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    pub password: String,
}

/// DTO describing the user attached to a session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[cfg_attr(test, derive(PartialEq, Eq, Clone))]
pub struct UserData {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    #[schema(example = "John Doe")]
    pub name: String,
}

impl From<domain::auth::UserIdentity> for UserData {
    fn from(value: domain::auth::UserIdentity) -> Self {
        UserData {
            id: value.id,
            email: value.email,
            name: value.name,
        }
    }
}

/// DTO returned by a successful signup or login, carrying the bearer token for
/// authenticated requests
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[cfg_attr(test, derive(PartialEq, Eq, Clone))]
pub struct Session {
    pub token: String,
    pub user: UserData,
}
