//! User persistence

use anyhow::Result;
use chrono::Utc;
use polartrend_common::db::models::User;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.get("id");

    Ok(User {
        id: Uuid::parse_str(&id)?,
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        password_salt: row.get("password_salt"),
        role: row.get("role"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, password_salt, role, created_at, updated_at";

/// Save a new user
pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, password_salt, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(&user.password_salt)
    .bind(&user.role)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a user by email
pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Load a user by id
pub async fn get_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// All users, newest first
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM users ORDER BY created_at DESC",
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(user_from_row).collect()
}

/// Update a user's profile fields (name and/or email)
pub async fn update_profile(
    pool: &SqlitePool,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE(?, name),
            email = COALESCE(?, email),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}
