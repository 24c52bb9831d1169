//! Per-repository SQL table keyed by operation kind.
//!
//! # Responsibility
//! - Keep each repository's statements next to the adapter that consumes
//!   their result shape.
//! - Resolve an operation kind to SQL text: declared entries first, then the
//!   adapter's default supplier.
//! - Substitute the `:ids` token of batch statements with a validated
//!   integer list literal.
//!
//! # Invariants
//! - When several entries share a kind, the first declared one wins.
//! - Only well-formed integer literals are ever spliced into statement text.

use super::crud_repo::{RepoError, RepoResult};
use super::operation::CrudOperation;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Named token replaced by the identity list in DELETE_MANY statements.
pub const IDS_PLACEHOLDER: &str = ":ids";

static IDS_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":ids\b").expect("valid ids placeholder regex"));
static INTEGER_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("valid integer literal regex"));

/// Setup defect in a repository's statement metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Neither a declaration nor a default supplier covers the operation.
    MissingStatement {
        repository: &'static str,
        operation: CrudOperation,
    },
    /// Batch statement lacks the `:ids` token.
    MissingPlaceholder {
        repository: &'static str,
        operation: CrudOperation,
    },
    /// Result set has no column labelled with the requested alias.
    MissingColumn(String),
    /// An extractor pushed back a row while another one was still buffered.
    PushBackOccupied,
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingStatement {
                repository,
                operation,
            } => write!(f, "no `{operation}` statement defined for `{repository}`"),
            Self::MissingPlaceholder {
                repository,
                operation,
            } => write!(
                f,
                "`{operation}` statement for `{repository}` has no `{IDS_PLACEHOLDER}` placeholder"
            ),
            Self::MissingColumn(alias) => write!(f, "column not found for alias `{alias}`"),
            Self::PushBackOccupied => {
                write!(f, "row cursor already holds a pushed-back record")
            }
        }
    }
}

impl Error for ConfigurationError {}

/// Ordered (operation kind, SQL text) declarations of one repository.
#[derive(Debug, Clone)]
pub struct SqlTable {
    repository: &'static str,
    entries: Vec<(CrudOperation, String)>,
}

impl SqlTable {
    pub fn new(repository: &'static str) -> Self {
        Self {
            repository,
            entries: Vec::new(),
        }
    }

    /// Appends a declaration. Earlier declarations of the same kind shadow it.
    pub fn declare(mut self, operation: CrudOperation, sql: impl Into<String>) -> Self {
        self.entries.push((operation, sql.into()));
        self
    }

    pub fn repository(&self) -> &'static str {
        self.repository
    }

    /// First declared statement for `operation`, if any.
    pub fn declared(&self, operation: CrudOperation) -> Option<&str> {
        self.entries
            .iter()
            .find(|(kind, _)| *kind == operation)
            .map(|(_, sql)| sql.as_str())
    }

    /// Resolves SQL for `operation`, consulting `default_sql` only when
    /// nothing was declared.
    pub fn resolve<F>(
        &self,
        operation: CrudOperation,
        default_sql: F,
    ) -> Result<Cow<'_, str>, ConfigurationError>
    where
        F: FnOnce(CrudOperation) -> Option<String>,
    {
        if let Some(sql) = self.declared(operation) {
            return Ok(Cow::Borrowed(sql));
        }
        default_sql(operation)
            .map(Cow::Owned)
            .ok_or(ConfigurationError::MissingStatement {
                repository: self.repository,
                operation,
            })
    }

    /// Replaces every `:ids` token in `template` with a comma-separated list.
    ///
    /// # Errors
    /// - `RepoError::Configuration` when `template` has no `:ids` token.
    /// - `RepoError::InvalidData` when a value is not an integer literal.
    pub fn bind_id_list<I, V>(&self, template: &str, ids: I) -> RepoResult<String>
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        if !IDS_PLACEHOLDER_RE.is_match(template) {
            return Err(ConfigurationError::MissingPlaceholder {
                repository: self.repository,
                operation: CrudOperation::DeleteMany,
            }
            .into());
        }

        let mut literals = Vec::new();
        for id in ids {
            let literal = id.to_string();
            if !INTEGER_LITERAL_RE.is_match(&literal) {
                return Err(RepoError::InvalidData(format!(
                    "refusing to splice non-integer id `{literal}` into `{}`",
                    self.repository
                )));
            }
            literals.push(literal);
        }

        let joined = literals.join(",");
        Ok(IDS_PLACEHOLDER_RE
            .replace_all(template, NoExpand(&joined))
            .into_owned())
    }
}
