//! Pair-level writes to `task_has_links`.
//!
//! An [`EdgePair`] is a logical link with both relation directions resolved.
//! Its write methods only accept an open [`Transaction`], so the two rows
//! are always written, rewritten or deleted together; dropping the
//! transaction on error rolls both back.

use rusqlite::{Connection, Transaction, params};

use crate::catalog::RelationCatalog;
use crate::error::{Constraint, LinkError, LinkResult, constraint_kind};
use crate::model::{LinkId, RelationId, TaskId, TaskLinkEvent};

/// The `(task_id, opposite_task_id, link_id)` triple of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRow {
    pub task_id: TaskId,
    pub opposite_task_id: TaskId,
    pub relation_id: RelationId,
}

impl LinkRow {
    /// Event payload for this row; `project_id` is filled in at publish time.
    #[must_use]
    pub const fn to_event(self) -> TaskLinkEvent {
        TaskLinkEvent {
            task_id: self.task_id,
            opposite_task_id: self.opposite_task_id,
            relation_id: self.relation_id,
            project_id: None,
        }
    }
}

/// Row ids of both halves of a stored pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairIds {
    pub forward: LinkId,
    pub mirror: LinkId,
}

/// A link between two tasks with both directions resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePair {
    task_id: TaskId,
    opposite_task_id: TaskId,
    relation_id: RelationId,
    opposite_relation_id: RelationId,
}

impl EdgePair {
    /// Resolve the opposite relation through the catalog.
    ///
    /// # Errors
    ///
    /// [`LinkError::UnknownRelation`] when `relation_id` is not in the catalog.
    pub fn resolve(
        conn: &Connection,
        task_id: TaskId,
        opposite_task_id: TaskId,
        relation_id: RelationId,
    ) -> LinkResult<Self> {
        let opposite_relation_id = RelationCatalog::new(conn).opposite_id(relation_id)?;
        Ok(Self {
            task_id,
            opposite_task_id,
            relation_id,
            opposite_relation_id,
        })
    }

    #[must_use]
    pub const fn forward(&self) -> LinkRow {
        LinkRow {
            task_id: self.task_id,
            opposite_task_id: self.opposite_task_id,
            relation_id: self.relation_id,
        }
    }

    #[must_use]
    pub const fn mirror(&self) -> LinkRow {
        LinkRow {
            task_id: self.opposite_task_id,
            opposite_task_id: self.task_id,
            relation_id: self.opposite_relation_id,
        }
    }

    /// Both rows in write order.
    #[must_use]
    pub const fn rows(&self) -> [LinkRow; 2] {
        [self.forward(), self.mirror()]
    }

    /// Insert the forward row, then the mirror row.
    ///
    /// # Errors
    ///
    /// [`LinkError::DuplicateLink`] if either row already exists,
    /// [`LinkError::UnknownTask`] if a task id does not resolve.
    pub fn insert(&self, tx: &Transaction<'_>) -> LinkResult<PairIds> {
        let forward = insert_row(tx, self.forward())?;
        let mirror = insert_row(tx, self.mirror())?;
        Ok(PairIds { forward, mirror })
    }

    /// Rewrite the stored pair `ids` to this pair's values.
    ///
    /// # Errors
    ///
    /// [`LinkError::PartialWrite`] if either update does not touch exactly
    /// one row, plus the constraint errors of [`EdgePair::insert`].
    pub fn update(&self, tx: &Transaction<'_>, ids: PairIds) -> LinkResult<()> {
        update_row(tx, ids.forward, self.forward(), "forward row")?;
        update_row(tx, ids.mirror, self.mirror(), "mirror row")?;
        Ok(())
    }

    /// Delete `forward_id` and the row matching this pair's mirror triple.
    ///
    /// Returns whether a mirror row was found and deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete statement fails.
    pub fn delete(&self, tx: &Transaction<'_>, forward_id: LinkId) -> LinkResult<bool> {
        tx.execute("DELETE FROM task_has_links WHERE id = ?1", params![forward_id])?;

        let mirror = self.mirror();
        let deleted = tx.execute(
            "DELETE FROM task_has_links \
             WHERE link_id = ?1 AND task_id = ?2 AND opposite_task_id = ?3",
            params![mirror.relation_id, mirror.task_id, mirror.opposite_task_id],
        )?;
        Ok(deleted > 0)
    }
}

fn insert_row(tx: &Transaction<'_>, row: LinkRow) -> LinkResult<LinkId> {
    tx.execute(
        "INSERT INTO task_has_links (task_id, opposite_task_id, link_id) VALUES (?1, ?2, ?3)",
        params![row.task_id, row.opposite_task_id, row.relation_id],
    )
    .map_err(|err| write_error(err, row))?;
    Ok(tx.last_insert_rowid())
}

fn update_row(
    tx: &Transaction<'_>,
    link_id: LinkId,
    row: LinkRow,
    label: &'static str,
) -> LinkResult<()> {
    let affected = tx
        .execute(
            "UPDATE task_has_links SET task_id = ?2, opposite_task_id = ?3, link_id = ?4 \
             WHERE id = ?1",
            params![link_id, row.task_id, row.opposite_task_id, row.relation_id],
        )
        .map_err(|err| write_error(err, row))?;

    if affected == 1 {
        Ok(())
    } else {
        Err(LinkError::PartialWrite {
            link_id,
            row: label,
            affected,
        })
    }
}

fn write_error(err: rusqlite::Error, row: LinkRow) -> LinkError {
    match constraint_kind(&err) {
        Some(Constraint::Unique) => LinkError::DuplicateLink {
            task_id: row.task_id,
            opposite_task_id: row.opposite_task_id,
            relation_id: row.relation_id,
        },
        Some(Constraint::ForeignKey) => LinkError::UnknownTask {
            task_id: row.task_id,
            opposite_task_id: row.opposite_task_id,
        },
        None => LinkError::Storage(err),
    }
}

#[cfg(test)]
mod tests {
    use super::{EdgePair, PairIds};
    use crate::db::{configure_connection, migrations};
    use crate::error::LinkError;
    use rusqlite::{Connection, Transaction, TransactionBehavior};
    use std::time::Duration;

    fn seeded_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        configure_connection(&conn, Duration::from_secs(1)).expect("configure");
        migrations::migrate(&mut conn).expect("migrate schema");
        conn.execute_batch(
            "INSERT INTO projects (id, name) VALUES (1, 'Board');
             INSERT INTO columns (id, project_id, title) VALUES (1, 1, 'Backlog');
             INSERT INTO tasks (id, title, project_id, column_id) VALUES
                 (1, 'One', 1, 1), (2, 'Two', 1, 1), (3, 'Three', 1, 1);",
        )
        .expect("seed rows");
        conn
    }

    fn row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM task_has_links", [], |row| row.get(0))
            .expect("count rows")
    }

    #[test]
    fn mirror_swaps_tasks_and_relation() {
        let conn = seeded_conn();
        let pair = EdgePair::resolve(&conn, 1, 2, 6).expect("resolve");
        let mirror = pair.mirror();
        assert_eq!(
            (mirror.task_id, mirror.opposite_task_id, mirror.relation_id),
            (2, 1, 7)
        );
    }

    #[test]
    fn update_of_missing_mirror_rolls_back_forward_write() {
        let conn = seeded_conn();
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate).expect("begin");
        let ids = EdgePair::resolve(&tx, 1, 2, 1)
            .expect("resolve")
            .insert(&tx)
            .expect("insert");
        tx.commit().expect("commit");

        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate).expect("begin");
        let retarget = EdgePair::resolve(&tx, 1, 3, 1).expect("resolve");
        let err = retarget
            .update(
                &tx,
                PairIds {
                    forward: ids.forward,
                    mirror: 9_999,
                },
            )
            .expect_err("missing mirror id");
        assert!(matches!(
            err,
            LinkError::PartialWrite {
                affected: 0,
                row: "mirror row",
                ..
            }
        ));
        drop(tx);

        let target: i64 = conn
            .query_row(
                "SELECT opposite_task_id FROM task_has_links WHERE id = ?1",
                [ids.forward],
                |row| row.get(0),
            )
            .expect("forward row");
        assert_eq!(target, 2, "forward write must be rolled back");
    }

    #[test]
    fn symmetric_self_link_is_a_duplicate() {
        let conn = seeded_conn();
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate).expect("begin");
        let err = EdgePair::resolve(&tx, 1, 1, 3)
            .expect("resolve")
            .insert(&tx)
            .expect_err("mirror equals forward");
        assert!(matches!(err, LinkError::DuplicateLink { .. }));
        drop(tx);
        assert_eq!(row_count(&conn), 0);
    }

    #[test]
    fn link_to_missing_task_is_unknown_task() {
        let conn = seeded_conn();
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate).expect("begin");
        let err = EdgePair::resolve(&tx, 1, 42, 1)
            .expect("resolve")
            .insert(&tx)
            .expect_err("task 42 missing");
        assert!(matches!(
            err,
            LinkError::UnknownTask {
                opposite_task_id: 42,
                ..
            }
        ));
    }

    #[test]
    fn delete_reports_missing_mirror() {
        let conn = seeded_conn();
        conn.execute(
            "INSERT INTO task_has_links (id, task_id, opposite_task_id, link_id) VALUES (5, 1, 2, 1)",
            [],
        )
        .expect("orphan row");

        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate).expect("begin");
        let pair = EdgePair::resolve(&tx, 1, 2, 1).expect("resolve");
        assert!(!pair.delete(&tx, 5).expect("delete"));
        tx.commit().expect("commit");
        assert_eq!(row_count(&conn), 0);
    }
}
