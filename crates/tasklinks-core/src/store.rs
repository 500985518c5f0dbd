//! The link store: pair-level create, update, remove and listing.
//!
//! # Atomicity
//!
//! Every mutation opens one `BEGIN IMMEDIATE` transaction holding all of its
//! reads (row load, mirror lookup, opposite resolution) and both row writes.
//! Any error drops the transaction, which rolls back; no half-written pair is
//! ever committed.
//!
//! # Events
//!
//! Events are published after commit, one per written row, forward row
//! first. `remove` publishes nothing unless
//! [`StoreOptions::publish_on_remove`] is set.

use std::sync::Arc;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::config::EventsConfig;
use crate::db::pair::{EdgePair, LinkRow, PairIds};
use crate::db::query;
use crate::error::{LinkError, LinkResult};
use crate::event::{EVENT_CREATE_UPDATE, EVENT_DELETE, EventSink};
use crate::model::{LabelGroup, LinkId, LinkedTask, RelationId, TaskId, TaskLink, group_by_label};

/// Behavior switches for a [`LinkStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub publish_on_remove: bool,
}

impl From<&EventsConfig> for StoreOptions {
    fn from(config: &EventsConfig) -> Self {
        Self {
            publish_on_remove: config.publish_on_remove,
        }
    }
}

/// Keeps forward and mirror link rows consistent.
pub struct LinkStore<'conn> {
    conn: &'conn Connection,
    sink: Arc<dyn EventSink>,
    options: StoreOptions,
}

impl<'conn> LinkStore<'conn> {
    /// Create a store over `conn` publishing to `sink`.
    pub fn new(conn: &'conn Connection, sink: Arc<dyn EventSink>) -> Self {
        Self::with_options(conn, sink, StoreOptions::default())
    }

    pub fn with_options(
        conn: &'conn Connection,
        sink: Arc<dyn EventSink>,
        options: StoreOptions,
    ) -> Self {
        Self {
            conn,
            sink,
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> StoreOptions {
        self.options
    }

    /// Fetch one link row by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_by_id(&self, link_id: LinkId) -> LinkResult<Option<TaskLink>> {
        query::get_link(self.conn, link_id)
    }

    /// Find the row mirroring `link`.
    ///
    /// `None` means the pair invariant is broken for `link`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the relation is unknown.
    pub fn find_mirror(&self, link: &TaskLink) -> LinkResult<Option<TaskLink>> {
        query::find_mirror(self.conn, link)
    }

    /// Every link of `task_id`, enriched and ordered by relation id, column
    /// position (desc), active flag (desc), task position, then task id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_all(&self, task_id: TaskId) -> LinkResult<Vec<LinkedTask>> {
        query::list_linked_tasks(self.conn, task_id)
    }

    /// [`LinkStore::get_all`] partitioned by label in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_all_grouped_by_label(&self, task_id: TaskId) -> LinkResult<Vec<LabelGroup>> {
        Ok(group_by_label(self.get_all(task_id)?))
    }

    /// Number of link rows owned by `task_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, task_id: TaskId) -> LinkResult<usize> {
        query::count_links(self.conn, task_id)
    }

    /// Link `task_id` to `opposite_task_id` and return the forward row id.
    ///
    /// # Errors
    ///
    /// - [`LinkError::UnknownRelation`] for a relation outside the catalog
    /// - [`LinkError::DuplicateLink`] if either row already exists
    /// - [`LinkError::UnknownTask`] if a task does not exist
    pub fn create(
        &self,
        task_id: TaskId,
        opposite_task_id: TaskId,
        relation_id: RelationId,
    ) -> LinkResult<LinkId> {
        let tx = self.begin()?;
        let pair = EdgePair::resolve(&tx, task_id, opposite_task_id, relation_id)?;
        let ids = pair.insert(&tx)?;
        tx.commit()?;

        tracing::debug!(
            link_id = ids.forward,
            mirror_id = ids.mirror,
            task_id,
            opposite_task_id,
            relation_id,
            "created task link pair"
        );

        self.publish(EVENT_CREATE_UPDATE, &pair.rows());
        Ok(ids.forward)
    }

    /// Rewrite the pair containing `link_id`. Both row ids are kept.
    ///
    /// # Errors
    ///
    /// - [`LinkError::NotFound`] if `link_id` does not exist
    /// - [`LinkError::IntegrityAnomaly`] if the current mirror row is missing
    /// - [`LinkError::PartialWrite`] if a row write was lost; nothing commits
    /// - the errors of [`LinkStore::create`] for the new values
    pub fn update(
        &self,
        link_id: LinkId,
        task_id: TaskId,
        opposite_task_id: TaskId,
        relation_id: RelationId,
    ) -> LinkResult<()> {
        let tx = self.begin()?;
        let current = query::get_link(&tx, link_id)?.ok_or(LinkError::NotFound { link_id })?;
        let mirror = query::find_mirror(&tx, &current)?.ok_or_else(|| anomaly(&current))?;

        let pair = EdgePair::resolve(&tx, task_id, opposite_task_id, relation_id)?;
        pair.update(
            &tx,
            PairIds {
                forward: link_id,
                mirror: mirror.id,
            },
        )?;
        tx.commit()?;

        tracing::debug!(
            link_id,
            mirror_id = mirror.id,
            task_id,
            opposite_task_id,
            relation_id,
            "updated task link pair"
        );

        self.publish(EVENT_CREATE_UPDATE, &pair.rows());
        Ok(())
    }

    /// Delete the pair containing `link_id`.
    ///
    /// A missing mirror row does not fail the removal; it is logged.
    ///
    /// # Errors
    ///
    /// [`LinkError::NotFound`] if `link_id` does not exist, including when the
    /// pair was already removed.
    pub fn remove(&self, link_id: LinkId) -> LinkResult<()> {
        let tx = self.begin()?;
        let link = query::get_link(&tx, link_id)?.ok_or(LinkError::NotFound { link_id })?;
        let pair = EdgePair::resolve(&tx, link.task_id, link.opposite_task_id, link.relation_id)?;
        let mirror_deleted = pair.delete(&tx, link_id)?;
        tx.commit()?;

        if mirror_deleted {
            tracing::debug!(
                link_id,
                task_id = link.task_id,
                opposite_task_id = link.opposite_task_id,
                "removed task link pair"
            );
        } else {
            tracing::warn!(
                link_id,
                task_id = link.task_id,
                opposite_task_id = link.opposite_task_id,
                relation_id = link.relation_id,
                "removed task link without a mirror row"
            );
        }

        if self.options.publish_on_remove {
            self.publish(EVENT_DELETE, &pair.rows());
        }
        Ok(())
    }

    fn begin(&self) -> LinkResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn publish(&self, name: &str, rows: &[LinkRow]) {
        for row in rows {
            let mut event = row.to_event();
            event.project_id = match query::task_project_id(self.conn, row.task_id) {
                Ok(project_id) => project_id,
                Err(error) => {
                    tracing::warn!(task_id = row.task_id, %error, "project lookup for event failed");
                    None
                }
            };
            self.sink.publish(name, &event);
        }
    }
}

fn anomaly(link: &TaskLink) -> LinkError {
    tracing::warn!(
        link_id = link.id,
        task_id = link.task_id,
        opposite_task_id = link.opposite_task_id,
        relation_id = link.relation_id,
        "task link has no mirror row"
    );
    LinkError::IntegrityAnomaly {
        link_id: link.id,
        task_id: link.task_id,
        opposite_task_id: link.opposite_task_id,
        relation_id: link.relation_id,
    }
}
