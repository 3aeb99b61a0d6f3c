use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::db::collation::{self, ES_CI};

/// What the caller expects back from a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Select,
    /// UPDATE / DELETE
    Modify,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// A parameterized SQL statement. Parameters are positional (`?1`, `?2`, ...)
/// and bound in the order they were added.
#[derive(Debug, Clone)]
pub struct Statement {
    kind: StatementKind,
    sql: &'static str,
    params: Vec<Value>,
}

impl Statement {
    pub fn new(kind: StatementKind, sql: &'static str) -> Self {
        Self {
            kind,
            sql,
            params: Vec::new(),
        }
    }

    pub fn insert(sql: &'static str) -> Self {
        Self::new(StatementKind::Insert, sql)
    }

    pub fn select(sql: &'static str) -> Self {
        Self::new(StatementKind::Select, sql)
    }

    pub fn modify(sql: &'static str) -> Self {
        Self::new(StatementKind::Modify, sql)
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

pub enum Outcome {
    Inserted(i64),
    Rows(Vec<SqliteRow>),
    Affected(u64),
}

impl Outcome {
    pub fn inserted_id(&self) -> Option<i64> {
        match self {
            Outcome::Inserted(id) => Some(*id),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Vec<SqliteRow> {
        match self {
            Outcome::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }

    /// For UPDATE / DELETE: whether any row was touched.
    pub fn succeeded(&self) -> bool {
        match self {
            Outcome::Affected(n) => *n > 0,
            _ => true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        Self::connect_url(&config.database_url, config.max_connections).await
    }

    pub async fn connect_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        // estudiantes.curso_id may dangle after a course is deleted
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(false)
            .collation(ES_CI, collation::compare);

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if url.contains(":memory:") {
            // every connection would otherwise get its own empty database
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            error!("failed to connect to {}: {}", url, e);
            e
        })?;
        info!("connected to {}", url);

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run(&self, statement: Statement) -> Result<Outcome, sqlx::Error> {
        debug!(kind = ?statement.kind, params = ?statement.params, "Running Query: {}", statement.sql.trim());

        let Statement { kind, sql, params } = statement;
        let mut query = sqlx::query(sql);
        for value in params {
            query = match value {
                Value::Int(v) => query.bind(v),
                Value::Text(v) => query.bind(v),
            };
        }

        let result = match kind {
            StatementKind::Insert => query
                .execute(&self.pool)
                .await
                .map(|r| Outcome::Inserted(r.last_insert_rowid())),
            StatementKind::Select => query.fetch_all(&self.pool).await.map(Outcome::Rows),
            StatementKind::Modify => query
                .execute(&self.pool)
                .await
                .map(|r| Outcome::Affected(r.rows_affected())),
        };

        result.map_err(|e| {
            error!("Something went wrong with query: {}", e);
            e
        })
    }
}
