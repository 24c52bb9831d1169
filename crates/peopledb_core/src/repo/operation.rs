//! Operation kinds used to key SQL resolution.

use std::fmt::{Display, Formatter};

/// Fixed set of statement categories a repository resolves SQL for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudOperation {
    Save,
    Update,
    FindById,
    FindAll,
    DeleteOne,
    DeleteMany,
    Count,
    /// One-off schema evolution statement.
    Alter,
}

impl CrudOperation {
    /// Stable token used in log events and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Update => "update",
            Self::FindById => "find_by_id",
            Self::FindAll => "find_all",
            Self::DeleteOne => "delete_one",
            Self::DeleteMany => "delete_many",
            Self::Count => "count",
            Self::Alter => "alter",
        }
    }
}

impl Display for CrudOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
