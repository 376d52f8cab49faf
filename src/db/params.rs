//! Parameter binding utilities for PostgreSQL statements.

use crate::models::QueryParam;
use sqlx::Postgres;
use sqlx::postgres::PgArguments;

/// Bind a parameter to a PostgreSQL query.
pub(crate) fn bind_postgres_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
    }
}

/// Bind a parameter to a typed PostgreSQL query.
pub(crate) fn bind_postgres_param_as<'q, O>(
    query: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    param: &'q QueryParam,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments> {
    match param {
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
    }
}
