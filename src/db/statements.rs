//! SQL statements for `sampleapp_table`.
//!
//! All SQL text is fixed at compile time. Request values are only ever bound
//! as positional parameters.

use crate::models::{FlagUpdate, QueryParam, Statement};

pub const TABLE_NAME: &str = "sampleapp_table";

/// Name given to the row the bootstrap inserts.
pub const SEED_ROW_NAME: &str = "sampleapp";

pub const DROP_TABLE_SQL: &str = "DROP TABLE IF EXISTS sampleapp_table";

pub const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS sampleapp_table (\
    id SERIAL PRIMARY KEY, \
    name TEXT, \
    job0001_flag BOOLEAN NOT NULL DEFAULT false, \
    job0002_flag BOOLEAN NOT NULL DEFAULT false, \
    job0003_flag BOOLEAN NOT NULL DEFAULT false, \
    job0004_flag BOOLEAN NOT NULL DEFAULT false, \
    job0005_flag BOOLEAN NOT NULL DEFAULT false)";

pub const INSERT_SEED_SQL: &str = "INSERT INTO sampleapp_table (name) VALUES ($1)";

pub const SELECT_ALL_SQL: &str = "SELECT id, name, job0001_flag, job0002_flag, job0003_flag, \
    job0004_flag, job0005_flag FROM sampleapp_table ORDER BY id";

pub const SELECT_BY_ID_SQL: &str = "SELECT id, name, job0001_flag, job0002_flag, job0003_flag, \
    job0004_flag, job0005_flag FROM sampleapp_table WHERE id=$1";

pub const UPDATE_FLAGS_SQL: &str = "UPDATE sampleapp_table SET job0001_flag=$1, job0002_flag=$2, \
    job0003_flag=$3, job0004_flag=$4, job0005_flag=$5 WHERE id=$6";

pub fn select_all() -> Statement {
    Statement::new(SELECT_ALL_SQL)
}

pub fn select_by_id(id: i32) -> Statement {
    Statement::new(SELECT_BY_ID_SQL).bind(QueryParam::Int(id))
}

/// Five flags as `$1..$5`, then the id as `$6`.
pub fn update_flags(update: &FlagUpdate) -> Statement {
    update
        .flags
        .iter()
        .fold(Statement::new(UPDATE_FLAGS_SQL), |stmt, flag| {
            stmt.bind(QueryParam::Bool(*flag))
        })
        .bind(QueryParam::Int(update.id))
}

/// Drop, recreate, then seed one row.
pub fn bootstrap() -> [Statement; 3] {
    [
        Statement::new(DROP_TABLE_SQL),
        Statement::new(CREATE_TABLE_SQL),
        Statement::new(INSERT_SEED_SQL).bind(QueryParam::String(SEED_ROW_NAME.to_string())),
    ]
}
