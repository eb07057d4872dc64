//! Query-execution interfaces.
//!
//! The warehouse query service is an external collaborator: this crate only
//! defines the seam it is reached through and an in-memory implementation
//! used by tests and demos.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::InsightError;
use crate::types::{ConnectionName, QuerySlug, SqlText};

/// Handle for a SQL query registered with the query service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSqlQuery {
    /// Slug used to run the query; absent when the service refused it.
    pub slug: Option<QuerySlug>,
}

/// Executes raw SQL against a named warehouse connection.
///
/// Mirrors the two-step create/run flow of the hosting BI platform:
/// `create_sql_query` registers the statement, `run_sql_query` executes it
/// and returns JSON rows.
pub trait QueryRunner: Send + Sync {
    /// Register `sql` to run on `connection`.
    fn create_sql_query(
        &self,
        connection: &str,
        sql: &str,
    ) -> Result<CreatedSqlQuery, InsightError>;

    /// Run a registered query and return its rows as JSON objects.
    fn run_sql_query(&self, slug: &str) -> Result<Vec<Value>, InsightError>;
}

impl<R: QueryRunner + ?Sized> QueryRunner for Arc<R> {
    fn create_sql_query(
        &self,
        connection: &str,
        sql: &str,
    ) -> Result<CreatedSqlQuery, InsightError> {
        (**self).create_sql_query(connection, sql)
    }

    fn run_sql_query(&self, slug: &str) -> Result<Vec<Value>, InsightError> {
        (**self).run_sql_query(slug)
    }
}

/// SQL statement captured by [`InMemoryQueryRunner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedQuery {
    /// Connection the statement was registered on.
    pub connection: ConnectionName,
    /// Statement text.
    pub sql: SqlText,
    /// Slug handed back to the caller.
    pub slug: QuerySlug,
}

/// Query runner that answers every query with a fixed row set.
#[derive(Clone, Default)]
pub struct InMemoryQueryRunner {
    rows: Arc<Vec<Value>>,
    state: Arc<Mutex<RunnerState>>,
}

#[derive(Default)]
struct RunnerState {
    issued: Vec<IssuedQuery>,
    registered: HashMap<QuerySlug, usize>,
    refuse: bool,
}

impl InMemoryQueryRunner {
    /// Runner that returns `rows` for every executed query.
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows: Arc::new(rows),
            state: Arc::default(),
        }
    }

    /// Runner whose `create_sql_query` never hands out a slug.
    pub fn refusing() -> Self {
        let runner = Self::default();
        runner.state.lock().expect("runner state poisoned").refuse = true;
        runner
    }

    /// Every statement registered so far, in order.
    pub fn issued(&self) -> Vec<IssuedQuery> {
        self.state
            .lock()
            .expect("runner state poisoned")
            .issued
            .clone()
    }
}

impl QueryRunner for InMemoryQueryRunner {
    fn create_sql_query(
        &self,
        connection: &str,
        sql: &str,
    ) -> Result<CreatedSqlQuery, InsightError> {
        let mut state = self.state.lock().expect("runner state poisoned");
        if state.refuse {
            return Ok(CreatedSqlQuery::default());
        }
        let slug = format!("q{}", state.issued.len());
        let position = state.issued.len();
        state.issued.push(IssuedQuery {
            connection: connection.to_string(),
            sql: sql.to_string(),
            slug: slug.clone(),
        });
        state.registered.insert(slug.clone(), position);
        Ok(CreatedSqlQuery { slug: Some(slug) })
    }

    fn run_sql_query(&self, slug: &str) -> Result<Vec<Value>, InsightError> {
        let state = self.state.lock().expect("runner state poisoned");
        let Some(position) = state.registered.get(slug) else {
            return Err(InsightError::QueryFailed {
                connection: "in-memory".to_string(),
                reason: format!("unknown query slug '{slug}'"),
            });
        };
        debug!("[insights:query] running query #{} ({})", position, slug);
        Ok(self.rows.as_ref().clone())
    }
}
