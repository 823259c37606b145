pub mod file_records;
pub mod memory;
pub mod subscriptions;

/// Embedded migrations, applied at startup with `MIGRATOR.run(&pool)`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
