use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{PgRepository, conflict_on_unique, corrupt};
use crate::error::RepositoryError;
use crate::repository::UserRepository;
use crate::types::{Email, UserId, UserRole};
use crate::user::{ProfileUpdate, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, phone, address, image_url, \
     active, deleted, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    phone: String,
    address: String,
    image_url: Option<String>,
    active: bool,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| corrupt("email", e))?;
        let role: UserRole = r.role.parse().map_err(|e| corrupt("role", e))?;
        Ok(Self {
            id: r.id,
            name: r.name,
            email,
            password_hash: r.password_hash,
            role,
            phone: r.phone,
            address: r.address,
            image_url: r.image_url,
            active: r.active,
            deleted: r.deleted,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, password_hash, role, phone, address, image_url,
                               active, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.image_url)
        .bind(user.active)
        .bind(user.deleted)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "user"))?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or(RepositoryError::NotFound).and_then(User::try_from)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn update_user_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users \
             SET name = $2, phone = $3, address = $4, \
                 image_url = COALESCE($5, image_url), updated_at = $6 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.image_url)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound).and_then(User::try_from)
    }
}
