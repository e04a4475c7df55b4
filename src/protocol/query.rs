//! Query definitions
//!
//! A query is an ordered list of opaque string tokens, command name first.

/// A single query in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    tokens: Vec<String>,
}

impl Query {
    /// Start a query with its command name
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            tokens: vec![command.into()],
        }
    }

    /// Build a query from raw tokens (may be empty)
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.tokens.push(arg.into());
        self
    }

    /// `SET key value`
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new("SET").arg(key).arg(value)
    }

    /// `GET key`
    pub fn get(key: impl Into<String>) -> Self {
        Self::new("GET").arg(key)
    }

    /// Command name, if any tokens are present
    pub fn command(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
