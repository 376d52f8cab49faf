//! Statement and parameter models.
//!
//! A [`Statement`] pairs fixed SQL text with positionally bound parameters.
//! Request input only ever reaches the database through `params`.

/// A parameter value for parameterized statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// Boolean value
    Bool(bool),
    /// Integer value, bound as PostgreSQL INTEGER
    Int(i32),
    /// String value
    String(String),
}

/// SQL text plus positional (`$1`, `$2`, ...) parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: &'static str,
    pub params: Vec<QueryParam>,
}

impl Statement {
    pub fn new(sql: &'static str) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, param: QueryParam) -> Self {
        self.params.push(param);
        self
    }
}
