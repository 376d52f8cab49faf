//! In-memory connector used by the integration tests.
//!
//! Interprets the fixed `sampleapp_table` statements against a vector of rows
//! and records every connection and statement so tests can assert exactly
//! what reached the "database".

#![allow(dead_code)]

use sampleapp_records::db::statements::{
    CREATE_TABLE_SQL, DROP_TABLE_SQL, INSERT_SEED_SQL, SELECT_ALL_SQL, SELECT_BY_ID_SQL,
    UPDATE_FLAGS_SQL,
};
use sampleapp_records::db::{Connector, StatementExecutor};
use sampleapp_records::error::{AppError, AppResult, ErrorKind};
use sampleapp_records::models::{QueryParam, RowRecord, Statement};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct MemoryDb {
    pub table_exists: bool,
    pub rows: Vec<RowRecord>,
    pub next_id: i32,
    pub statements: Vec<Statement>,
    pub connects: usize,
    pub closes: usize,
    pub connect_error: Option<(ErrorKind, String)>,
    /// Statement that fails with a query error when executed
    pub failing_sql: Option<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    pub db: Arc<Mutex<MemoryDb>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector whose table already holds the bootstrap seed row.
    pub fn seeded() -> Self {
        let connector = Self::new();
        {
            let mut db = connector.db.lock().unwrap();
            db.table_exists = true;
            db.rows.push(RowRecord::new(1, "sampleapp"));
            db.next_id = 2;
        }
        connector
    }

    pub fn failing(kind: ErrorKind, message: &str) -> Self {
        let connector = Self::new();
        connector.db.lock().unwrap().connect_error = Some((kind, message.to_string()));
        connector
    }

    /// Make every execution of `sql` fail as if the connection dropped.
    pub fn fail_statement(&self, sql: &'static str) {
        self.db.lock().unwrap().failing_sql = Some(sql);
    }

    pub fn table_exists(&self) -> bool {
        self.db.lock().unwrap().table_exists
    }

    pub fn connects(&self) -> usize {
        self.db.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.db.lock().unwrap().closes
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.db.lock().unwrap().statements.clone()
    }

    pub fn rows(&self) -> Vec<RowRecord> {
        self.db.lock().unwrap().rows.clone()
    }

    pub fn clear_log(&self) {
        let mut db = self.db.lock().unwrap();
        db.statements.clear();
        db.connects = 0;
        db.closes = 0;
    }
}

pub struct MemoryConnection {
    db: Arc<Mutex<MemoryDb>>,
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self) -> AppResult<MemoryConnection> {
        let mut db = self.db.lock().unwrap();
        db.connects += 1;
        if let Some((kind, message)) = &db.connect_error {
            return Err(match kind {
                ErrorKind::Credential => AppError::credential(message.clone()),
                ErrorKind::Query => AppError::query(message.clone(), None),
                ErrorKind::Validation => AppError::validation(message.clone()),
            });
        }
        Ok(MemoryConnection {
            db: self.db.clone(),
        })
    }
}

fn missing_table() -> AppError {
    AppError::query(
        "relation \"sampleapp_table\" does not exist",
        Some("42P01".to_string()),
    )
}

impl StatementExecutor for MemoryConnection {
    async fn execute(&mut self, statement: &Statement) -> AppResult<u64> {
        let mut db = self.db.lock().unwrap();
        db.statements.push(statement.clone());
        if db.failing_sql == Some(statement.sql) {
            return Err(AppError::query("connection reset", None));
        }

        match statement.sql {
            DROP_TABLE_SQL => {
                db.table_exists = false;
                db.rows.clear();
                Ok(0)
            }
            CREATE_TABLE_SQL => {
                if !db.table_exists {
                    db.table_exists = true;
                    db.rows.clear();
                    db.next_id = 1;
                }
                Ok(0)
            }
            INSERT_SEED_SQL => {
                if !db.table_exists {
                    return Err(missing_table());
                }
                let name = match statement.params.first() {
                    Some(QueryParam::String(name)) => name.clone(),
                    other => panic!("unexpected seed params: {:?}", other),
                };
                let id = db.next_id.max(1);
                db.rows.push(RowRecord::new(id, name));
                db.next_id = id + 1;
                Ok(1)
            }
            UPDATE_FLAGS_SQL => {
                if !db.table_exists {
                    return Err(missing_table());
                }
                let mut flags = [false; 5];
                for (slot, param) in flags.iter_mut().zip(&statement.params[..5]) {
                    match param {
                        QueryParam::Bool(v) => *slot = *v,
                        other => panic!("flag bound as {:?}", other),
                    }
                }
                let id = match statement.params[5] {
                    QueryParam::Int(id) => id,
                    ref other => panic!("id bound as {:?}", other),
                };
                let mut affected = 0;
                for row in db.rows.iter_mut().filter(|row| row.id == id) {
                    row.set_flags(flags);
                    affected += 1;
                }
                Ok(affected)
            }
            other => Err(AppError::query(format!("unsupported statement: {}", other), None)),
        }
    }

    async fn execute_batch(&mut self, statements: &[Statement]) -> AppResult<u64> {
        let (table_exists, rows, next_id) = {
            let db = self.db.lock().unwrap();
            (db.table_exists, db.rows.clone(), db.next_id)
        };

        let mut total = 0;
        for statement in statements {
            match self.execute(statement).await {
                Ok(n) => total += n,
                Err(e) => {
                    // Roll back
                    let mut db = self.db.lock().unwrap();
                    db.table_exists = table_exists;
                    db.rows = rows;
                    db.next_id = next_id;
                    return Err(e);
                }
            }
        }
        Ok(total)
    }

    async fn fetch_records(&mut self, statement: &Statement) -> AppResult<Vec<RowRecord>> {
        let mut db = self.db.lock().unwrap();
        db.statements.push(statement.clone());
        if !db.table_exists {
            return Err(missing_table());
        }

        let mut rows = db.rows.clone();
        rows.sort_by_key(|row| row.id);
        match statement.sql {
            SELECT_ALL_SQL => Ok(rows),
            SELECT_BY_ID_SQL => {
                let id = match statement.params.first() {
                    Some(QueryParam::Int(id)) => *id,
                    other => panic!("unexpected select params: {:?}", other),
                };
                Ok(rows.into_iter().filter(|row| row.id == id).collect())
            }
            other => Err(AppError::query(format!("unsupported query: {}", other), None)),
        }
    }

    async fn close(self) -> AppResult<()> {
        self.db.lock().unwrap().closes += 1;
        Ok(())
    }
}
