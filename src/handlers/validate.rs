//! Request parameter validation.
//!
//! Runs before any connection is opened: a request that fails here never
//! reaches the database.

use crate::error::{AppError, AppResult};
use crate::models::{FLAG_COUNT, FLAG_NAMES, FlagUpdate};
use std::collections::HashMap;

pub const ID_PARAM: &str = "id";

/// Parse a record id from a path segment or query value.
pub fn parse_record_id(raw: &str) -> AppResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::validation(format!("id must be an integer, got {:?}", raw)))
}

/// A flag must be exactly `"true"` or `"false"`.
pub fn parse_flag(name: &str, raw: &str) -> AppResult<bool> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::validation(format!(
            "{} must be \"true\" or \"false\", got {:?}",
            name, other
        ))),
    }
}

/// Validate the update route's six query parameters.
pub fn parse_flag_update(query: &HashMap<String, String>) -> AppResult<FlagUpdate> {
    let missing: Vec<&str> = std::iter::once(ID_PARAM)
        .chain(FLAG_NAMES)
        .filter(|name| !query.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::validation(format!(
            "Missing required query parameters: {}",
            missing.join(", ")
        )));
    }

    let id = parse_record_id(&query[ID_PARAM])?;
    let mut flags = [false; FLAG_COUNT];
    for (slot, name) in flags.iter_mut().zip(FLAG_NAMES) {
        *slot = parse_flag(name, &query[name])?;
    }

    Ok(FlagUpdate { id, flags })
}
