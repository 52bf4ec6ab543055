//! SQL provisioning script for the Éval'École SQLite store.
//!
//! Nothing here runs implicitly. An operator applies it through
//! [`SqliteStore::provision`](crate::SqliteStore::provision) (or prints it
//! with `evalecole-server schema`); until then the store reports that it
//! needs provisioning.

/// Table DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS classes (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id                 TEXT PRIMARY KEY,
    full_name          TEXT NOT NULL,
    username           TEXT,
    password           TEXT,
    role               TEXT NOT NULL,    -- 'Élève' | 'Professeur' | 'Surveillant' | ...
    active             BOOLEAN DEFAULT 1,
    class_id           TEXT,             -- students only; may dangle
    assigned_class_ids TEXT              -- teachers only; JSON array of class ids
);

-- Events are never updated. Resets delete rows in bulk.
CREATE TABLE IF NOT EXISTS events (
    id             TEXT PRIMARY KEY,
    date_time      TEXT NOT NULL,        -- RFC 3339 UTC, millisecond precision
    created_by_id  TEXT NOT NULL,
    student_id     TEXT,
    target_user_id TEXT NOT NULL,
    action_id      TEXT,                 -- exactly one of action_id /
    custom_label   TEXT,                 -- custom_label is set
    points         INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS events_target_idx ON events(target_user_id);
";

/// Starting data: the administrator account, the 24 default classes and a
/// few accounts to try the application with. Re-running it leaves existing
/// rows untouched.
pub const SEED: &str = "
INSERT OR IGNORE INTO users (id, full_name, username, password, role, active)
VALUES ('u1', 'Administrateur', 'Paul', 'Paul2025.', 'Admin', 1);

INSERT OR IGNORE INTO classes (id, name) VALUES
('c_6ème_A', '6ème A'), ('c_6ème_B', '6ème B'), ('c_6ème_C', '6ème C'),
('c_6ème_D', '6ème D'), ('c_6ème_E', '6ème E'), ('c_6ème_F', '6ème F'),
('c_5ème_A', '5ème A'), ('c_5ème_B', '5ème B'), ('c_5ème_C', '5ème C'),
('c_5ème_D', '5ème D'), ('c_5ème_E', '5ème E'), ('c_5ème_F', '5ème F'),
('c_4ème_A', '4ème A'), ('c_4ème_B', '4ème B'), ('c_4ème_C', '4ème C'),
('c_4ème_D', '4ème D'), ('c_4ème_E', '4ème E'), ('c_4ème_F', '4ème F'),
('c_3ème_A', '3ème A'), ('c_3ème_B', '3ème B'), ('c_3ème_C', '3ème C'),
('c_3ème_D', '3ème D'), ('c_3ème_E', '3ème E'), ('c_3ème_F', '3ème F');

INSERT OR IGNORE INTO users (id, full_name, role, active, assigned_class_ids) VALUES
('u_prof1', 'M. Dupont', 'Professeur', 1, '[\"c_6ème_A\",\"c_6ème_B\"]'),
('u_prof2', 'Mme Durand', 'Professeur', 1, '[\"c_6ème_A\"]');

INSERT OR IGNORE INTO users (id, full_name, role, active) VALUES
('u_surv1', 'Mme Martin', 'Surveillant', 1),
('u_dir1', 'M. Le Directeur', 'Direction', 1);

INSERT OR IGNORE INTO users (id, full_name, username, password, role, active, class_id)
VALUES ('u_eleve1', 'Lucas', 'eleve1', '123', 'Élève', 1, 'c_6ème_A');
";

/// The full script shown to an operator.
pub fn setup_script() -> String { format!("{SCHEMA}{SEED}") }
