//! Row record model for `sampleapp_table`.

use serde::{Deserialize, Serialize};

/// Number of job flag columns on a row.
pub const FLAG_COUNT: usize = 5;

/// Query-string names of the flag columns, in binding order.
pub const FLAG_NAMES: [&str; FLAG_COUNT] = [
    "job0001_flag",
    "job0002_flag",
    "job0003_flag",
    "job0004_flag",
    "job0005_flag",
];

/// A single row of `sampleapp_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RowRecord {
    pub id: i32,
    pub name: Option<String>,
    pub job0001_flag: bool,
    pub job0002_flag: bool,
    pub job0003_flag: bool,
    pub job0004_flag: bool,
    pub job0005_flag: bool,
}

impl RowRecord {
    /// A fresh row with every flag cleared, as the column defaults produce.
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            job0001_flag: false,
            job0002_flag: false,
            job0003_flag: false,
            job0004_flag: false,
            job0005_flag: false,
        }
    }

    pub fn flags(&self) -> [bool; FLAG_COUNT] {
        [
            self.job0001_flag,
            self.job0002_flag,
            self.job0003_flag,
            self.job0004_flag,
            self.job0005_flag,
        ]
    }

    pub fn set_flags(&mut self, flags: [bool; FLAG_COUNT]) {
        let [f1, f2, f3, f4, f5] = flags;
        self.job0001_flag = f1;
        self.job0002_flag = f2;
        self.job0003_flag = f3;
        self.job0004_flag = f4;
        self.job0005_flag = f5;
    }
}

/// Validated flag update for one row, keyed by primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagUpdate {
    pub id: i32,
    pub flags: [bool; FLAG_COUNT],
}

/// Result body of a flag update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Number of rows the UPDATE touched (0 when the id does not exist)
    pub rows_affected: u64,
}
