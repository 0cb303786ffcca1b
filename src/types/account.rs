use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

/// Answer of the hosted auth service to a successful sign-in.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    pub access_token: String,
    // seconds
    pub expires_in: i64,
}

/// Claims carried by the session cookie.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    pub exp: DateTime<Utc>,
    pub user_name: String,
    pub access_token: String,
    pub nbf: DateTime<Utc>,
}
