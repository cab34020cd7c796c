//! Storage adapters: PostgreSQL for expense data, Redis for dialog state.

pub mod postgres;
pub mod redis;

pub use postgres::PgExpenseStore;
pub use redis::RedisDialogStore;
