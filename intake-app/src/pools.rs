//! Database pools for the three Postgres-backed adapters.

use intake_repo::Schema;
use sqlx::PgPool;

use crate::config::Config;

/// One pool per adapter. Adapters configured with the same URL share a pool.
pub struct Pools {
    pub store: PgPool,
    pub ledger: PgPool,
    pub queue: PgPool,
}

/// Groups adapter schemas by database URL, in first-seen order.
fn schema_plan(config: &Config) -> Vec<(&str, Vec<Schema>)> {
    let targets = [
        (config.database_url.as_str(), Schema::Store),
        (config.ledger_database_url.as_str(), Schema::Ledger),
        (config.queue_database_url.as_str(), Schema::Queue),
    ];

    let mut plan: Vec<(&str, Vec<Schema>)> = Vec::new();
    for (url, schema) in targets {
        match plan.iter_mut().find(|(seen, _)| *seen == url) {
            Some((_, schemas)) => schemas.push(schema),
            None => plan.push((url, vec![schema])),
        }
    }
    plan
}

impl Pools {
    /// Connects each distinct database once and migrates only the tables
    /// of the adapters using it.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let plan = schema_plan(config);
        if plan.len() > 1 {
            tracing::info!(databases = plan.len(), "Using separate adapter databases");
        }

        let mut store = None;
        let mut ledger = None;
        let mut queue = None;
        for (url, schemas) in &plan {
            let pool = intake_repo::connect(url, schemas).await?;
            for schema in schemas {
                let slot = match schema {
                    Schema::Store => &mut store,
                    Schema::Ledger => &mut ledger,
                    Schema::Queue => &mut queue,
                };
                *slot = Some(pool.clone());
            }
        }

        match (store, ledger, queue) {
            (Some(store), Some(ledger), Some(queue)) => Ok(Self {
                store,
                ledger,
                queue,
            }),
            _ => anyhow::bail!("database plan left an adapter without a pool"),
        }
    }
}
