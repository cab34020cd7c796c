//! PostgreSQL-backed `ExpenseStore` using runtime queries.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

use etb_core::domain::{Category, Expense, NewExpense, NewUser, UserConfig};
use etb_core::ports::ExpenseStore;
use etb_core::{Error, Result};

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        user_tg_id BIGINT PRIMARY KEY
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_configs (
        tg_id BIGINT PRIMARY KEY REFERENCES users (user_tg_id) ON DELETE CASCADE,
        language VARCHAR(32) NOT NULL,
        currency VARCHAR(32) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id SERIAL PRIMARY KEY,
        name VARCHAR(64) NOT NULL,
        config_id BIGINT NOT NULL REFERENCES user_configs (tg_id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id SERIAL PRIMARY KEY,
        name VARCHAR(128) NOT NULL,
        currency VARCHAR(32) NOT NULL,
        amount DOUBLE PRECISION NOT NULL,
        date DATE NOT NULL,
        user_tg_id BIGINT NOT NULL REFERENCES users (user_tg_id) ON DELETE CASCADE,
        category_id INTEGER NOT NULL REFERENCES categories (id) ON DELETE CASCADE
    )
    "#,
];

const DROP_SCHEMA: [&str; 4] = [
    "DROP TABLE IF EXISTS expenses",
    "DROP TABLE IF EXISTS categories",
    "DROP TABLE IF EXISTS user_configs",
    "DROP TABLE IF EXISTS users",
];

fn map_sqlx(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return Error::Duplicate(db_err.message().to_string());
        }
    }
    Error::Storage(err.to_string())
}

#[derive(Clone)]
pub struct PgExpenseStore {
    pool: PgPool,
}

impl PgExpenseStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(map_sqlx)?;
        Ok(Self { pool })
    }

    /// Create all tables if they do not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        }
        info!("database schema initialized");
        Ok(())
    }

    /// Drop all tables and recreate them empty.
    pub async fn reset_schema(&self) -> Result<()> {
        for statement in DROP_SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        }
        info!("database schema dropped");
        self.init_schema().await
    }
}

#[async_trait]
impl ExpenseStore for PgExpenseStore {
    async fn register_user(&self, user: NewUser) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        sqlx::query("INSERT INTO users (user_tg_id) VALUES ($1)")
            .bind(user.tg_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        sqlx::query("INSERT INTO user_configs (tg_id, language, currency) VALUES ($1, $2, $3)")
            .bind(user.tg_id)
            .bind(&user.language)
            .bind(&user.currency)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        for name in &user.categories {
            sqlx::query("INSERT INTO categories (name, config_id) VALUES ($1, $2)")
                .bind(name)
                .bind(user.tg_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }

        tx.commit().await.map_err(map_sqlx)?;
        info!(tg_id = user.tg_id, "registered user");
        Ok(())
    }

    async fn user_config(&self, tg_id: i64) -> Result<UserConfig> {
        let row = sqlx::query("SELECT language, currency FROM user_configs WHERE tg_id = $1")
            .bind(tg_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or(Error::UserConfigNotFound(tg_id))?;

        Ok(UserConfig {
            tg_id,
            language: row.get("language"),
            currency: row.get("currency"),
        })
    }

    async fn set_language(&self, tg_id: i64, language: &str) -> Result<()> {
        let result = sqlx::query("UPDATE user_configs SET language = $1 WHERE tg_id = $2")
            .bind(language)
            .bind(tg_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(Error::UserConfigNotFound(tg_id));
        }
        Ok(())
    }

    async fn set_currency(&self, tg_id: i64, currency: &str) -> Result<()> {
        let result = sqlx::query("UPDATE user_configs SET currency = $1 WHERE tg_id = $2")
            .bind(currency)
            .bind(tg_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(Error::UserConfigNotFound(tg_id));
        }
        Ok(())
    }

    async fn add_categories(&self, tg_id: i64, names: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for name in names {
            sqlx::query("INSERT INTO categories (name, config_id) VALUES ($1, $2)")
                .bind(name)
                .bind(tg_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_sqlx)
    }

    async fn categories(&self, tg_id: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories WHERE config_id = $1 ORDER BY id")
            .bind(tg_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(rows
            .into_iter()
            .map(|row| Category {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn remove_category(&self, tg_id: i64, category_id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND config_id = $2")
            .bind(category_id)
            .bind(tg_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(Error::CategoryNotFound(category_id));
        }
        Ok(())
    }

    async fn add_expense(&self, expense: NewExpense) -> Result<()> {
        sqlx::query(
            "INSERT INTO expenses (name, currency, amount, date, user_tg_id, category_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&expense.name)
        .bind(&expense.currency)
        .bind(expense.amount)
        .bind(expense.date)
        .bind(expense.user_tg_id)
        .bind(expense.category_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn expenses(&self, tg_id: i64) -> Result<Vec<Expense>> {
        let rows = sqlx::query(
            "SELECT id, name, currency, amount, date, user_tg_id, category_id \
             FROM expenses WHERE user_tg_id = $1 ORDER BY date, id",
        )
        .bind(tg_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if rows.is_empty() {
            return Err(Error::NoExpenses(tg_id));
        }

        Ok(rows
            .into_iter()
            .map(|row| Expense {
                id: row.get("id"),
                name: row.get("name"),
                currency: row.get("currency"),
                amount: row.get("amount"),
                date: row.get("date"),
                user_tg_id: row.get("user_tg_id"),
                category_id: row.get("category_id"),
            })
            .collect())
    }

    async fn currencies_used(&self, tg_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT currency FROM expenses WHERE user_tg_id = $1 ORDER BY currency",
        )
        .bind(tg_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(|row| row.get("currency")).collect())
    }
}
