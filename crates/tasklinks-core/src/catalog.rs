//! Relation catalog backed by the `relation_types` table.
//!
//! Every relation type has a label and an opposite. Directional types come in
//! pairs (`blocks` / `is blocked by`); a symmetric type such as `relates to`
//! stores `opposite_id = 0` and resolves to itself.

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};

use crate::error::{Constraint, LinkError, LinkResult, constraint_kind};
use crate::model::RelationId;

/// One catalog entry with its opposite already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationType {
    pub id: RelationId,
    pub label: String,
    pub opposite_id: RelationId,
}

impl RelationType {
    #[must_use]
    pub const fn is_symmetric(&self) -> bool {
        self.id == self.opposite_id
    }
}

/// Read access to the relation catalog, plus [`RelationCatalog::define`] for
/// registering custom relation types.
#[derive(Clone, Copy)]
pub struct RelationCatalog<'conn> {
    conn: &'conn Connection,
}

impl<'conn> RelationCatalog<'conn> {
    #[must_use]
    pub const fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Resolve the opposite relation of `relation_id`.
    ///
    /// # Errors
    ///
    /// [`LinkError::UnknownRelation`] when the id is not in the catalog.
    pub fn opposite_id(&self, relation_id: RelationId) -> LinkResult<RelationId> {
        let opposite: Option<RelationId> = self
            .conn
            .query_row(
                "SELECT opposite_id FROM relation_types WHERE id = ?1",
                params![relation_id],
                |row| row.get(0),
            )
            .optional()?;

        match opposite {
            Some(0) => Ok(relation_id),
            Some(opposite) => Ok(opposite),
            None => Err(LinkError::UnknownRelation { relation_id }),
        }
    }

    /// Label of `relation_id` as seen from the owning task.
    ///
    /// # Errors
    ///
    /// [`LinkError::UnknownRelation`] when the id is not in the catalog.
    pub fn label(&self, relation_id: RelationId) -> LinkResult<String> {
        self.conn
            .query_row(
                "SELECT label FROM relation_types WHERE id = ?1",
                params![relation_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(LinkError::UnknownRelation { relation_id })
    }

    /// Full catalog ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list(&self) -> LinkResult<Vec<RelationType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, label, CASE opposite_id WHEN 0 THEN id ELSE opposite_id END \
             FROM relation_types ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RelationType {
                id: row.get(0)?,
                label: row.get(1)?,
                opposite_id: row.get(2)?,
            })
        })?;

        let mut relations = Vec::new();
        for row in rows {
            relations.push(row?);
        }
        Ok(relations)
    }

    /// Register a relation type. With `opposite_label` two entries pointing at
    /// each other are created; without it the relation is symmetric.
    ///
    /// Returns the id of the `label` entry.
    ///
    /// # Errors
    ///
    /// [`LinkError::DuplicateRelationLabel`] when either label already exists.
    pub fn define(&self, label: &str, opposite_label: Option<&str>) -> LinkResult<RelationId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let id = insert_label(&tx, label)?;
        if let Some(opposite_label) = opposite_label {
            let opposite_id = insert_label(&tx, opposite_label)?;
            tx.execute(
                "UPDATE relation_types SET opposite_id = ?2 WHERE id = ?1",
                params![id, opposite_id],
            )?;
            tx.execute(
                "UPDATE relation_types SET opposite_id = ?2 WHERE id = ?1",
                params![opposite_id, id],
            )?;
        }
        tx.commit()?;

        tracing::debug!(relation_id = id, label, ?opposite_label, "defined relation type");
        Ok(id)
    }
}

fn insert_label(tx: &Transaction<'_>, label: &str) -> LinkResult<RelationId> {
    match tx.execute(
        "INSERT INTO relation_types (label, opposite_id) VALUES (?1, 0)",
        params![label],
    ) {
        Ok(_) => Ok(tx.last_insert_rowid()),
        Err(err) if constraint_kind(&err) == Some(Constraint::Unique) => {
            Err(LinkError::DuplicateRelationLabel {
                label: label.to_string(),
            })
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::RelationCatalog;
    use crate::db::migrations;
    use crate::error::LinkError;
    use rusqlite::Connection;

    fn test_db() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        migrations::migrate(&mut conn).expect("migrate schema");
        conn
    }

    #[test]
    fn opposite_is_an_involution() {
        let conn = test_db();
        let catalog = RelationCatalog::new(&conn);

        for relation in catalog.list().expect("list catalog") {
            let opposite = catalog.opposite_id(relation.id).expect("resolve opposite");
            assert_eq!(
                catalog.opposite_id(opposite).expect("resolve back"),
                relation.id,
                "opposite(opposite({})) must round-trip",
                relation.label
            );
        }
    }

    #[test]
    fn symmetric_relation_is_its_own_opposite() {
        let conn = test_db();
        let catalog = RelationCatalog::new(&conn);

        assert_eq!(catalog.opposite_id(3).expect("relates to"), 3);
        assert_eq!(catalog.label(3).expect("label"), "relates to");
        assert_eq!(catalog.opposite_id(1).expect("blocks"), 2);
        assert_eq!(catalog.label(2).expect("label"), "is blocked by");
    }

    #[test]
    fn unknown_relation_is_reported() {
        let conn = test_db();
        let catalog = RelationCatalog::new(&conn);

        assert!(matches!(
            catalog.opposite_id(999),
            Err(LinkError::UnknownRelation { relation_id: 999 })
        ));
        assert!(matches!(
            catalog.label(999),
            Err(LinkError::UnknownRelation { relation_id: 999 })
        ));
    }

    #[test]
    fn define_creates_mutual_pair() {
        let conn = test_db();
        let catalog = RelationCatalog::new(&conn);

        let id = catalog
            .define("supersedes", Some("is superseded by"))
            .expect("define pair");
        let opposite = catalog.opposite_id(id).expect("opposite");

        assert_ne!(id, opposite);
        assert_eq!(catalog.label(opposite).expect("label"), "is superseded by");
        assert_eq!(catalog.opposite_id(opposite).expect("back"), id);
    }

    #[test]
    fn define_without_opposite_is_symmetric() {
        let conn = test_db();
        let catalog = RelationCatalog::new(&conn);

        let id = catalog.define("pairs with", None).expect("define");
        let relation = catalog
            .list()
            .expect("list")
            .into_iter()
            .find(|r| r.id == id)
            .expect("new relation listed");
        assert!(relation.is_symmetric());
    }

    #[test]
    fn define_rejects_duplicate_label_and_rolls_back() {
        let conn = test_db();
        let catalog = RelationCatalog::new(&conn);
        let before = catalog.list().expect("list").len();

        let err = catalog
            .define("mentors", Some("blocks"))
            .expect_err("existing opposite label");
        assert!(matches!(err, LinkError::DuplicateRelationLabel { ref label } if label == "blocks"));
        assert_eq!(catalog.list().expect("list").len(), before);
    }
}
