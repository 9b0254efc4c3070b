use sqlx::FromRow;

/// User record in the database. Clients see it through `dto::PublicUser`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,          // 0 until the gateway assigns one
    pub username: String,
    pub email: String,
    pub password: String, // argon2 PHC string once written through the service
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}
