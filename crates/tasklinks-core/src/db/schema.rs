//! Canonical SQLite schema for the link store.
//!
//! - `projects`, `columns`, `users`, `tasks` hold the minimal board fields the
//!   link listing joins against; their lifecycle belongs to the host tracker
//! - `relation_types` is the relation catalog; `opposite_id = 0` marks a
//!   symmetric relation that is its own opposite
//! - `task_has_links` stores each link pair as two mirrored rows

/// Migration v1: board tables, relation catalog, and the link table.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0)
);

CREATE TABLE IF NOT EXISTS columns (
    id INTEGER PRIMARY KEY,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    name TEXT
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    column_id INTEGER NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
    owner_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    position INTEGER NOT NULL DEFAULT 0,
    color_id TEXT NOT NULL DEFAULT 'yellow',
    time_spent REAL NOT NULL DEFAULT 0,
    time_estimated REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS relation_types (
    id INTEGER PRIMARY KEY,
    label TEXT NOT NULL UNIQUE CHECK (length(trim(label)) > 0),
    opposite_id INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS task_has_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link_id INTEGER NOT NULL REFERENCES relation_types(id) ON DELETE CASCADE,
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    opposite_task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS task_has_links_unique
    ON task_has_links(link_id, task_id, opposite_task_id);
";

/// Migration v2: read-path indexes and the default relation catalog.
///
/// Catalog ids are fixed so listings order `blocks` ahead of `relates to`.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_task_has_links_task
    ON task_has_links(task_id);

CREATE INDEX IF NOT EXISTS idx_task_has_links_mirror
    ON task_has_links(opposite_task_id, task_id);

CREATE INDEX IF NOT EXISTS idx_tasks_project
    ON tasks(project_id);

CREATE INDEX IF NOT EXISTS idx_columns_project_position
    ON columns(project_id, position);

INSERT OR IGNORE INTO relation_types (id, label, opposite_id) VALUES
    (1, 'blocks', 2),
    (2, 'is blocked by', 1),
    (3, 'relates to', 0),
    (4, 'duplicates', 5),
    (5, 'is duplicated by', 4),
    (6, 'is a child of', 7),
    (7, 'is a parent of', 6),
    (8, 'targets milestone', 9),
    (9, 'is a milestone of', 8),
    (10, 'fixes', 11),
    (11, 'is fixed by', 10);
";

/// Indexes expected by the listing and mirror lookup paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "task_has_links_unique",
    "idx_task_has_links_task",
    "idx_task_has_links_mirror",
    "idx_tasks_project",
    "idx_columns_project_position",
];
