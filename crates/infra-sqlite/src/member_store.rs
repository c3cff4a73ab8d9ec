// SQLite OrderedMemberStore Implementation

use async_trait::async_trait;
use sqlx::{QueryBuilder, SqlitePool};
use turnstile_core::domain::Token;
use turnstile_core::error::{AppError, Result};
use turnstile_core::port::OrderedMemberStore;

// Helper to convert sqlx::Error to AppError with structured information.
// Everything maps to Store: the caller treats store failures as transient.
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "5" => {
                        // SQLITE_BUSY - database is locked
                        AppError::Store(format!(
                            "Store locked (SQLITE_BUSY): {}",
                            db_err.message()
                        ))
                    }
                    "13" => {
                        // SQLITE_FULL - database or disk is full
                        AppError::Store(format!("Store full: {}", db_err.message()))
                    }
                    _ => AppError::Store(format!(
                        "Store error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Store(format!("Store error: {}", db_err.message()))
            }
        }
        _ => {
            // Connection, pool, protocol errors
            AppError::Store(err.to_string())
        }
    }
}

/// One logical sorted set within the shared `queue_members` table.
///
/// `set_key` namespaces the rows, so the four sets of a two-queue deployment
/// (entrance/order x wait/active) share one pool and one schema. Each trait
/// operation is a single SQL statement; ties on equal scores break by
/// `(score, member)` lexicographic order.
pub struct SqliteMemberStore {
    pool: SqlitePool,
    set_key: String,
}

impl SqliteMemberStore {
    pub fn new(pool: SqlitePool, set_key: impl Into<String>) -> Self {
        Self {
            pool,
            set_key: set_key.into(),
        }
    }
}

#[async_trait]
impl OrderedMemberStore for SqliteMemberStore {
    async fn upsert(&self, token: &str, score: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_members (set_key, member, score)
            VALUES (?, ?, ?)
            ON CONFLICT (set_key, member) DO UPDATE SET score = excluded.score
            "#,
        )
        .bind(&self.set_key)
        .bind(token)
        .bind(score)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn remove(&self, tokens: &[Token]) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("DELETE FROM queue_members WHERE set_key = ");
        builder.push_bind(&self.set_key);
        builder.push(" AND member IN (");
        let mut separated = builder.separated(", ");
        for token in tokens {
            separated.push_bind(token);
        }
        separated.push_unseparated(")");

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn rank(&self, token: &str) -> Result<Option<i64>> {
        // Correlated count of members ordered before the target; one statement,
        // None if the target is not a member
        let rank: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT (
                SELECT COUNT(*) FROM queue_members o
                WHERE o.set_key = t.set_key
                  AND (o.score < t.score OR (o.score = t.score AND o.member < t.member))
            )
            FROM queue_members t
            WHERE t.set_key = ? AND t.member = ?
            "#,
        )
        .bind(&self.set_key)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rank)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM queue_members WHERE set_key = ?")
                .bind(&self.set_key)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn range_ascending(&self, start: i64, stop: i64) -> Result<Vec<Token>> {
        if start < 0 || stop < start {
            return Ok(Vec::new());
        }

        let members: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT member FROM queue_members
            WHERE set_key = ?
            ORDER BY score ASC, member ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&self.set_key)
        .bind(stop - start + 1)
        .bind(start)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(members)
    }

    async fn remove_range_by_score(&self, min: i64, max: i64) -> Result<i64> {
        let result = sqlx::query(
            "DELETE FROM queue_members WHERE set_key = ? AND score BETWEEN ? AND ?",
        )
        .bind(&self.set_key)
        .bind(min)
        .bind(max)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as i64)
    }
}
