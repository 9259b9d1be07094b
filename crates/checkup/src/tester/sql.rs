//! SQL testers: open a connection per run and read a single count.
//!
//! `mysql` checks go through sqlx with a `mysql://` DSN, `libsql` checks
//! open a local database file or a remote `libsql://` URL.

use std::collections::HashMap;

use sqlx::Connection as _;
use sqlx::mysql::MySqlConnection;
use tracing::debug;

use super::{Service, TestFn, Tester};
use crate::config::CheckConfig;
use crate::error::{ConfigError, ProbeError};
use crate::result::TestResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBackend {
    Mysql,
    Libsql,
}

impl SqlBackend {
    fn from_service(service: &str) -> Result<Self, ConfigError> {
        match service.parse::<Service>()? {
            Service::Mysql => Ok(SqlBackend::Mysql),
            Service::Libsql => Ok(SqlBackend::Libsql),
            other => Err(ConfigError::UnknownService(other.name().to_string())),
        }
    }

    /// Name of the count test for this backend.
    pub fn count_test(self) -> &'static str {
        match self {
            SqlBackend::Mysql => "mysql-query-count-nonzero",
            SqlBackend::Libsql => "libsql-query-count-nonzero",
        }
    }
}

/// An open connection, closed again in `tear_down`.
pub enum SqlConnection {
    Mysql(MySqlConnection),
    Libsql { _database: libsql::Database, connection: libsql::Connection },
}

/// State of one run.
pub struct SqlRun {
    pub count: Option<i64>,
    connection: SqlConnection,
}

pub struct SqlTester {
    backend: SqlBackend,
    dsn: String,
    auth_token: Option<String>,
    query: Option<String>,
    tests: HashMap<String, TestFn<SqlRun>>,
}

pub(crate) fn query_count_nonzero() -> TestFn<SqlRun> {
    Box::new(|run: &SqlRun| match run.count {
        Some(0) => TestResult::fail("Query returned zero count"),
        Some(_) => TestResult::pass(),
        None => TestResult::fail("No count query was executed"),
    })
}

impl SqlTester {
    pub fn backend(&self) -> SqlBackend {
        self.backend
    }

    async fn connect(&self) -> Result<SqlConnection, ProbeError> {
        match self.backend {
            SqlBackend::Mysql => MySqlConnection::connect(&self.dsn)
                .await
                .map(SqlConnection::Mysql)
                .map_err(|e| ProbeError::Connect(e.to_string())),
            SqlBackend::Libsql => {
                let builder_result = if is_remote(&self.dsn) {
                    let token = self.auth_token.clone().unwrap_or_default();
                    libsql::Builder::new_remote(self.dsn.clone(), token).build().await
                } else {
                    libsql::Builder::new_local(&self.dsn).build().await
                };
                let database = builder_result.map_err(|e| ProbeError::Connect(e.to_string()))?;
                let connection = database.connect().map_err(|e| ProbeError::Connect(e.to_string()))?;
                Ok(SqlConnection::Libsql { _database: database, connection })
            }
        }
    }

    async fn count(connection: &mut SqlConnection, query: &str) -> Result<i64, ProbeError> {
        match connection {
            SqlConnection::Mysql(conn) => sqlx::query_scalar::<_, i64>(query)
                .fetch_one(conn)
                .await
                .map_err(|e| ProbeError::Query(e.to_string())),
            SqlConnection::Libsql { connection, .. } => {
                let mut rows = connection
                    .query(query, ())
                    .await
                    .map_err(|e| ProbeError::Query(e.to_string()))?;
                let row = rows
                    .next()
                    .await
                    .map_err(|e| ProbeError::Query(e.to_string()))?
                    .ok_or_else(|| ProbeError::Query("query returned no rows".to_string()))?;
                row.get::<i64>(0).map_err(|e| ProbeError::Query(e.to_string()))
            }
        }
    }

    async fn close(connection: SqlConnection) -> Result<(), ProbeError> {
        match connection {
            SqlConnection::Mysql(conn) => conn.close().await.map_err(|e| ProbeError::Close(e.to_string())),
            SqlConnection::Libsql { .. } => Ok(()),
        }
    }
}

fn is_remote(dsn: &str) -> bool {
    ["libsql://", "https://", "http://"].iter().any(|scheme| dsn.starts_with(scheme))
}

#[async_trait::async_trait]
impl Tester for SqlTester {
    type Fixture = SqlRun;

    fn init(check: &CheckConfig) -> Result<Self, ConfigError> {
        let backend = SqlBackend::from_service(&check.service)?;
        let dsn = check.options.require_str("DSN")?.to_string();
        let auth_token = check.options.optional_str("AuthToken")?.map(str::to_string);
        let mut query = check.options.optional_str("Query")?.map(str::to_string);

        let mut tests = HashMap::new();
        for (name, info) in &check.tests {
            if name != backend.count_test() {
                return Err(ConfigError::UnknownTest(name.clone()));
            }
            if let Some(q) = info.arguments.optional_str("query").map_err(|e| e.in_test(name))? {
                query = Some(q.to_string());
            }
            if query.is_none() {
                return Err(ConfigError::Missing("query".to_string()).in_test(name));
            }
            tests.insert(name.clone(), query_count_nonzero());
        }

        Ok(Self { backend, dsn, auth_token, query, tests })
    }

    async fn set_up(&self) -> Result<SqlRun, ProbeError> {
        let mut connection = self.connect().await?;
        let count = match &self.query {
            Some(query) => {
                let counted = Self::count(&mut connection, query).await;
                match counted {
                    Ok(count) => Some(count),
                    Err(e) => {
                        if let Err(close) = Self::close(connection).await {
                            debug!("Closing connection after failed query: {}", close);
                        }
                        return Err(e);
                    }
                }
            }
            None => None,
        };
        Ok(SqlRun { count, connection })
    }

    async fn tear_down(&self, run: SqlRun) -> Result<(), ProbeError> {
        Self::close(run.connection).await
    }

    fn get(&self, name: &str) -> Option<&TestFn<SqlRun>> {
        self.tests.get(name)
    }
}
