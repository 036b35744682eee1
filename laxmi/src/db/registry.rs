// Profile schema history shipped with the app.
// Append new migrations at the end; never edit or renumber a released one.

use crate::db::migrations::{Migration, StaticMigrations};

const V1_ACCOUNTS: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    currency TEXT NOT NULL,
    opening_balance_cents INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    archived BOOLEAN NOT NULL DEFAULT FALSE
);
";

const V2_TRANSACTIONS: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL,
    occurred_on TEXT NOT NULL,
    amount_cents INTEGER NOT NULL,
    payee TEXT,
    memo TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_transactions_account_date
    ON transactions(account_id, occurred_on);
";

pub fn builtin() -> StaticMigrations {
    StaticMigrations::new(vec![
        Migration::sql(1, "create accounts", V1_ACCOUNTS),
        Migration::sql(2, "create transactions", V2_TRANSACTIONS),
    ])
}

#[cfg(test)]
mod tests {
    use crate::db::migrations::{MigrationSource, Migrator};
    use crate::db::schema::Database;
    use crate::db::schema_version::SchemaVersionStore;

    #[test]
    fn test_builtin_history_is_well_formed() {
        let migrations = super::builtin().discover().unwrap();
        let versions: Vec<u32> = migrations.iter().map(|m| m.version()).collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[test]
    fn test_builtin_history_applies_to_fresh_profile() {
        let mut db = Database::open_in_memory().unwrap();
        SchemaVersionStore::initialize(db.get_connection()).unwrap();

        let migrator = Migrator::builtin();
        let report = migrator.migrate(db.get_connection_mut()).unwrap();
        assert_eq!(report.to_version, migrator.latest_version().unwrap());

        let conn = db.get_connection();
        conn.execute(
            "INSERT INTO accounts (name, kind, currency, created_at)
             VALUES ('Checking', 'bank', 'INR', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        let account_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO transactions (account_id, occurred_on, amount_cents, created_at)
             VALUES (?1, '2026-01-02', -4500, '2026-01-02T09:00:00Z')",
            [account_id],
        )
        .unwrap();

        // foreign keys are enforced on profile connections
        let orphan = conn.execute(
            "INSERT INTO transactions (account_id, occurred_on, amount_cents, created_at)
             VALUES (999, '2026-01-02', 100, '2026-01-02T09:00:00Z')",
            [],
        );
        assert!(orphan.is_err());
    }
}
