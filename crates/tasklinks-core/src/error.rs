use std::fmt;

use crate::model::{LinkId, RelationId, TaskId};

/// Machine-readable error codes for link store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    LinkNotFound,
    DuplicateLink,
    UnknownRelation,
    UnknownTask,
    DuplicateRelationLabel,
    IntegrityAnomaly,
    PartialWrite,
    StorageFailure,
    LockContention,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::LinkNotFound,
        Self::DuplicateLink,
        Self::UnknownRelation,
        Self::UnknownTask,
        Self::DuplicateRelationLabel,
        Self::IntegrityAnomaly,
        Self::PartialWrite,
        Self::StorageFailure,
        Self::LockContention,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::LinkNotFound => "E2001",
            Self::DuplicateLink => "E2002",
            Self::UnknownRelation => "E2003",
            Self::UnknownTask => "E2004",
            Self::DuplicateRelationLabel => "E2005",
            Self::IntegrityAnomaly => "E3001",
            Self::PartialWrite => "E3002",
            Self::StorageFailure => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::LinkNotFound => "Task link not found",
            Self::DuplicateLink => "Task link already exists",
            Self::UnknownRelation => "Unknown relation type",
            Self::UnknownTask => "Linked task does not exist",
            Self::DuplicateRelationLabel => "Relation label already defined",
            Self::IntegrityAnomaly => "Mirror row missing for task link",
            Self::PartialWrite => "Task link pair write was incomplete",
            Self::StorageFailure => "Storage failure",
            Self::LockContention => "Database is locked",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::LinkNotFound | Self::DuplicateLink => None,
            Self::UnknownRelation => Some("Pick a relation id from the relation catalog."),
            Self::UnknownTask => Some("Create both tasks before linking them."),
            Self::DuplicateRelationLabel => Some("Reuse the existing relation or pick a new label."),
            Self::IntegrityAnomaly => {
                Some("The link table is inconsistent; remove the orphaned row and relink.")
            }
            Self::PartialWrite => Some("Nothing was committed. Retry the operation."),
            Self::StorageFailure => Some("Check database file permissions and disk space."),
            Self::LockContention => Some("Retry after the other writer commits."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures surfaced by the link store and relation catalog.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("task link {link_id} not found")]
    NotFound { link_id: LinkId },

    #[error(
        "task link {link_id} ({task_id} -> {opposite_task_id}, relation {relation_id}) has no mirror row"
    )]
    IntegrityAnomaly {
        link_id: LinkId,
        task_id: TaskId,
        opposite_task_id: TaskId,
        relation_id: RelationId,
    },

    #[error("task {task_id} is already linked to {opposite_task_id} with relation {relation_id}")]
    DuplicateLink {
        task_id: TaskId,
        opposite_task_id: TaskId,
        relation_id: RelationId,
    },

    #[error("pair write for link {link_id} touched {affected} row(s) of {row}, expected 1")]
    PartialWrite {
        link_id: LinkId,
        row: &'static str,
        affected: usize,
    },

    #[error("relation type {relation_id} is not in the catalog")]
    UnknownRelation { relation_id: RelationId },

    #[error("task {task_id} or {opposite_task_id} does not exist")]
    UnknownTask {
        task_id: TaskId,
        opposite_task_id: TaskId,
    },

    #[error("relation label '{label}' is already defined")]
    DuplicateRelationLabel { label: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl LinkError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::LinkNotFound,
            Self::IntegrityAnomaly { .. } => ErrorCode::IntegrityAnomaly,
            Self::DuplicateLink { .. } => ErrorCode::DuplicateLink,
            Self::PartialWrite { .. } => ErrorCode::PartialWrite,
            Self::UnknownRelation { .. } => ErrorCode::UnknownRelation,
            Self::UnknownTask { .. } => ErrorCode::UnknownTask,
            Self::DuplicateRelationLabel { .. } => ErrorCode::DuplicateRelationLabel,
            Self::Storage(err) => {
                if is_busy(err) {
                    ErrorCode::LockContention
                } else {
                    ErrorCode::StorageFailure
                }
            }
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Result alias used across the link store.
pub type LinkResult<T> = Result<T, LinkError>;

/// Classification of a constraint failure reported by SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
}

pub(crate) fn constraint_kind(err: &rusqlite::Error) -> Option<Constraint> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Some(Constraint::Unique),
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}

const fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked,
                ..
            },
            _
        )
    )
}

#[cfg(test)]
mod tests {
    use super::{Constraint, ErrorCode, LinkError, constraint_kind};
    use rusqlite::Connection;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ErrorCode::ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn not_found_duplicate_and_anomaly_are_distinct() {
        let not_found = LinkError::NotFound { link_id: 7 };
        let duplicate = LinkError::DuplicateLink {
            task_id: 1,
            opposite_task_id: 2,
            relation_id: 3,
        };
        let anomaly = LinkError::IntegrityAnomaly {
            link_id: 7,
            task_id: 1,
            opposite_task_id: 2,
            relation_id: 3,
        };

        let codes: HashSet<_> = [&not_found, &duplicate, &anomaly]
            .iter()
            .map(|err| err.code())
            .collect();
        assert_eq!(codes.len(), 3);
        assert_eq!(not_found.to_string(), "task link 7 not found");
    }

    #[test]
    fn unique_violation_is_classified() {
        let conn = Connection::open_in_memory().expect("open db");
        conn.execute_batch("CREATE TABLE t (v INTEGER UNIQUE); INSERT INTO t VALUES (1);")
            .expect("seed table");
        let err = conn
            .execute("INSERT INTO t VALUES (1)", [])
            .expect_err("duplicate must fail");
        assert_eq!(constraint_kind(&err), Some(Constraint::Unique));
        assert_eq!(LinkError::from(err).code(), ErrorCode::StorageFailure);
    }

    #[test]
    fn foreign_key_violation_is_classified() {
        let conn = Connection::open_in_memory().expect("open db");
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (parent_id INTEGER REFERENCES parent(id));",
        )
        .expect("seed tables");
        let err = conn
            .execute("INSERT INTO child VALUES (42)", [])
            .expect_err("dangling reference must fail");
        assert_eq!(constraint_kind(&err), Some(Constraint::ForeignKey));
    }
}
