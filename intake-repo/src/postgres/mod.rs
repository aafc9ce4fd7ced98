//! PostgreSQL adapters.
//!
//! One pool can back all three adapters, or each can point at its own
//! database (the ledger in particular is an independent system).

mod ledger;
mod queue;
mod store;
mod types;

#[cfg(test)]
mod tests;

use sqlx::PgPool;

pub use ledger::PostgresLedger;
pub use queue::PostgresQueue;
pub use store::PostgresStore;

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// The tables an adapter owns. A database gets only the schemas of the
/// adapters pointed at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Store,
    Ledger,
    Queue,
}

impl Schema {
    pub const ALL: [Schema; 3] = [Schema::Store, Schema::Ledger, Schema::Queue];

    fn migrations(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Schema::Store => &[
                (
                    "0001",
                    include_str!("../../migrations/0001_create_accounts_pg.sql"),
                ),
                (
                    "0002",
                    include_str!("../../migrations/0002_create_transactions_pg.sql"),
                ),
            ],
            Schema::Ledger => &[(
                "0003",
                include_str!("../../migrations/0003_create_ledger_pg.sql"),
            )],
            Schema::Queue => &[(
                "0004",
                include_str!("../../migrations/0004_create_queue_messages_pg.sql"),
            )],
        }
    }
}

/// Runs the migrations for `schemas`. Every statement is idempotent.
pub async fn run_migrations(pool: &PgPool, schemas: &[Schema]) -> Result<(), anyhow::Error> {
    for schema in schemas {
        for (name, sql) in schema.migrations() {
            execute_migration(pool, sql, name).await?;
        }
    }
    Ok(())
}

/// Connects to `database_url` and brings the given schemas up to date.
pub async fn connect(database_url: &str, schemas: &[Schema]) -> anyhow::Result<PgPool> {
    let pool = PgPool::connect(database_url).await?;
    run_migrations(&pool, schemas).await?;
    tracing::info!(?schemas, "connected to postgres");
    Ok(pool)
}
