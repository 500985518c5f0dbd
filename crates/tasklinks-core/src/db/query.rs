//! Read-side SQL for the link store.
//!
//! All functions take a shared `&Connection`, so they run equally against a
//! plain connection or inside an open [`rusqlite::Transaction`].

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::catalog::RelationCatalog;
use crate::error::LinkResult;
use crate::model::{LinkId, LinkedTask, ProjectId, TaskId, TaskLink};

const LINK_COLUMNS: &str = "id, task_id, opposite_task_id, link_id";

// Relation, opposite task, column and project are required; the assignee is
// optional so unassigned tasks stay listed.
const LISTING_SQL: &str = "\
    SELECT l.id, l.opposite_task_id, l.link_id, r.label, \
           t.title, t.is_active, t.project_id, t.column_id, t.color_id, \
           t.time_spent, t.time_estimated, t.owner_id, u.username, u.name, \
           c.title, p.name \
    FROM task_has_links l \
    INNER JOIN relation_types r ON r.id = l.link_id \
    INNER JOIN tasks t ON t.id = l.opposite_task_id \
    INNER JOIN columns c ON c.id = t.column_id \
    INNER JOIN projects p ON p.id = t.project_id \
    LEFT JOIN users u ON u.id = t.owner_id \
    WHERE l.task_id = ?1 \
    ORDER BY r.id ASC, c.position DESC, t.is_active DESC, t.position ASC, t.id ASC";

fn row_to_link(row: &Row<'_>) -> rusqlite::Result<TaskLink> {
    Ok(TaskLink {
        id: row.get(0)?,
        task_id: row.get(1)?,
        opposite_task_id: row.get(2)?,
        relation_id: row.get(3)?,
    })
}

fn row_to_linked_task(row: &Row<'_>) -> rusqlite::Result<LinkedTask> {
    Ok(LinkedTask {
        id: row.get(0)?,
        task_id: row.get(1)?,
        relation_id: row.get(2)?,
        label: row.get(3)?,
        title: row.get(4)?,
        is_active: row.get(5)?,
        project_id: row.get(6)?,
        column_id: row.get(7)?,
        color_id: row.get(8)?,
        task_time_spent: row.get(9)?,
        task_time_estimated: row.get(10)?,
        task_assignee_id: row.get(11)?,
        task_assignee_username: row.get(12)?,
        task_assignee_name: row.get(13)?,
        column_title: row.get(14)?,
        project_name: row.get(15)?,
    })
}

/// Fetch one link row by primary key.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_link(conn: &Connection, link_id: LinkId) -> LinkResult<Option<TaskLink>> {
    let link = conn
        .query_row(
            &format!("SELECT {LINK_COLUMNS} FROM task_has_links WHERE id = ?1"),
            params![link_id],
            row_to_link,
        )
        .optional()?;
    Ok(link)
}

/// Find the row mirroring `link`, matched by `(opposite_task_id, task_id,
/// opposite(relation))` through the unique index.
///
/// # Errors
///
/// Returns an error if the query fails or the relation is unknown.
pub fn find_mirror(conn: &Connection, link: &TaskLink) -> LinkResult<Option<TaskLink>> {
    let opposite_relation = RelationCatalog::new(conn).opposite_id(link.relation_id)?;
    let mirror = conn
        .query_row(
            &format!(
                "SELECT {LINK_COLUMNS} FROM task_has_links \
                 WHERE link_id = ?1 AND task_id = ?2 AND opposite_task_id = ?3"
            ),
            params![opposite_relation, link.opposite_task_id, link.task_id],
            row_to_link,
        )
        .optional()?;
    Ok(mirror)
}

/// Every link owned by `task_id`, enriched and in listing order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_linked_tasks(conn: &Connection, task_id: TaskId) -> LinkResult<Vec<LinkedTask>> {
    let mut stmt = conn.prepare_cached(LISTING_SQL)?;
    let rows = stmt.query_map(params![task_id], row_to_linked_task)?;

    let mut links = Vec::new();
    for row in rows {
        links.push(row?);
    }
    Ok(links)
}

/// Number of rows owned by `task_id`, without joins.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_links(conn: &Connection, task_id: TaskId) -> LinkResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM task_has_links WHERE task_id = ?1",
        params![task_id],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Project owning `task_id`, if the task exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn task_project_id(conn: &Connection, task_id: TaskId) -> LinkResult<Option<ProjectId>> {
    let project_id = conn
        .query_row(
            "SELECT project_id FROM tasks WHERE id = ?1",
            params![task_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(project_id)
}
