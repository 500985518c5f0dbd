//! Row and record types exchanged with the link store.
//!
//! Identifiers are plain SQLite rowids. A [`TaskLink`] is one physical row
//! of `task_has_links`; a [`LinkedTask`] is the same row as seen by the
//! listing read path, enriched from the opposite task and its board.

use serde::{Deserialize, Serialize};

/// Identifier of one `task_has_links` row.
pub type LinkId = i64;
/// Identifier of a task record.
pub type TaskId = i64;
/// Identifier of a relation type in the catalog.
pub type RelationId = i64;
/// Identifier of a project record.
pub type ProjectId = i64;

/// One directed half of a link pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskLink {
    pub id: LinkId,
    pub task_id: TaskId,
    pub opposite_task_id: TaskId,
    pub relation_id: RelationId,
}

/// A link row annotated with the opposite task's display fields.
///
/// `task_id` is the *opposite* task: listings are always read from the
/// owning task's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedTask {
    /// Row id of the owning task's half of the pair.
    pub id: LinkId,
    pub task_id: TaskId,
    pub relation_id: RelationId,
    pub label: String,
    pub title: String,
    pub is_active: bool,
    pub project_id: ProjectId,
    pub column_id: i64,
    pub color_id: String,
    pub task_time_spent: f64,
    pub task_time_estimated: f64,
    pub task_assignee_id: Option<i64>,
    pub task_assignee_username: Option<String>,
    pub task_assignee_name: Option<String>,
    pub column_title: String,
    pub project_name: String,
}

/// Links sharing one relation label, in listing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelGroup {
    pub label: String,
    pub links: Vec<LinkedTask>,
}

/// Payload published for every mutated link row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLinkEvent {
    pub task_id: TaskId,
    pub opposite_task_id: TaskId,
    pub relation_id: RelationId,
    /// Project owning `task_id`, looked up after commit. `None` when the
    /// task vanished in between.
    pub project_id: Option<ProjectId>,
}

/// Group an ordered listing by label, keeping first-seen label order.
#[must_use]
pub fn group_by_label(links: Vec<LinkedTask>) -> Vec<LabelGroup> {
    let mut groups: Vec<LabelGroup> = Vec::new();
    for link in links {
        match groups.iter_mut().find(|group| group.label == link.label) {
            Some(group) => group.links.push(link),
            None => groups.push(LabelGroup {
                label: link.label.clone(),
                links: vec![link],
            }),
        }
    }
    groups
}
