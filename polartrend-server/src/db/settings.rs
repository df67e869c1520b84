//! Settings table access

use anyhow::Result;
use sqlx::SqlitePool;

/// Read an integer setting, falling back to the given default when the key
/// is missing or unparsable
pub async fn get_i64(pool: &SqlitePool, key: &str, default: i64) -> i64 {
    let value: Result<Option<String>, _> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await;

    match value {
        Ok(Some(text)) => text.parse::<i64>().unwrap_or(default),
        _ => default,
    }
}

/// Write a setting value
pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}
