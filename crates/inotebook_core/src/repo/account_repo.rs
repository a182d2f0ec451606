//! Account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist account records and their session epoch.
//! - Advance the epoch atomically with the mutation that requires it.
//! - Delete an account together with everything it owns.
//!
//! # Invariants
//! - `email` is unique; collisions surface as `RepoError::Duplicate("email")`.
//! - Epoch advancement is a single `UPDATE ... RETURNING` statement and always
//!   yields a value strictly greater than the previous one.
//! - The delete cascade runs inside one transaction.

use crate::model::account::{Account, AccountId, Epoch, IdentityUpdate, NewAccount};
use crate::repo::{ensure_tables, map_unique_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ACCOUNT_COLUMNS: &str =
    "id, user_name, email, password_hash, phone, epoch_ms, created_at, updated_at";

/// Row counts removed by an account delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountDeletion {
    pub notes_removed: usize,
    pub images_removed: usize,
}

/// Repository interface for account records.
pub trait AccountRepository {
    /// Inserts a new account; fails with `Duplicate("email")` on collision.
    fn create_account(&self, account: &NewAccount, now_ms: i64) -> RepoResult<Account>;
    fn find_by_id(&self, id: AccountId) -> RepoResult<Option<Account>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>>;
    /// Moves the account to a new session generation.
    fn advance_epoch(&self, id: AccountId, now_ms: i64) -> RepoResult<Account>;
    /// Replaces identity fields and advances the epoch in one statement.
    fn update_identity(
        &self,
        id: AccountId,
        update: &IdentityUpdate,
        now_ms: i64,
    ) -> RepoResult<Account>;
    /// Replaces the credential hash. The epoch is left untouched.
    fn set_password_hash(&self, id: AccountId, password_hash: &str, now_ms: i64)
        -> RepoResult<()>;
    /// Removes the account, its notes and its image records.
    fn delete_account(&self, id: AccountId) -> RepoResult<AccountDeletion>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["accounts", "notes", "profile_images"])?;
        Ok(Self { conn })
    }

    fn query_one(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Option<Account>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_account_row(row)?)),
            None => Ok(None),
        }
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_account(&self, account: &NewAccount, now_ms: i64) -> RepoResult<Account> {
        self.conn
            .execute(
                "INSERT INTO accounts (
                    id,
                    user_name,
                    email,
                    password_hash,
                    phone,
                    epoch_ms,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
                params![
                    account.id.to_string(),
                    account.user_name.as_str(),
                    account.email.as_str(),
                    account.password_hash.as_str(),
                    account.phone.as_str(),
                    account.epoch.as_millis(),
                    now_ms,
                ],
            )
            .map_err(|err| map_unique_violation(err, "email"))?;

        self.find_by_id(account.id)?
            .ok_or(RepoError::NotFound(account.id))
    }

    fn find_by_id(&self, id: AccountId) -> RepoResult<Option<Account>> {
        self.query_one(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1;"),
            [id.to_string()],
        )
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        self.query_one(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1;"),
            [email],
        )
    }

    fn advance_epoch(&self, id: AccountId, now_ms: i64) -> RepoResult<Account> {
        let updated = self.query_one(
            &format!(
                "UPDATE accounts
                 SET
                    epoch_ms = MAX(?2, epoch_ms + 1),
                    updated_at = ?2
                 WHERE id = ?1
                 RETURNING {ACCOUNT_COLUMNS};"
            ),
            params![id.to_string(), now_ms],
        )?;
        updated.ok_or(RepoError::NotFound(id))
    }

    fn update_identity(
        &self,
        id: AccountId,
        update: &IdentityUpdate,
        now_ms: i64,
    ) -> RepoResult<Account> {
        let mut stmt = self.conn.prepare(&format!(
            "UPDATE accounts
             SET
                user_name = ?2,
                email = ?3,
                phone = ?4,
                epoch_ms = MAX(?5, epoch_ms + 1),
                updated_at = ?5
             WHERE id = ?1
             RETURNING {ACCOUNT_COLUMNS};"
        ))?;
        let updated = stmt
            .query_row(
                params![
                    id.to_string(),
                    update.user_name.as_str(),
                    update.email.as_str(),
                    update.phone.as_str(),
                    now_ms,
                ],
                |row| Ok(parse_account_row(row)),
            )
            .optional()
            .map_err(|err| map_unique_violation(err, "email"))?;

        match updated {
            Some(account) => account,
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn set_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
        now_ms: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE accounts
             SET
                password_hash = ?2,
                updated_at = ?3
             WHERE id = ?1;",
            params![id.to_string(), password_hash, now_ms],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_account(&self, id: AccountId) -> RepoResult<AccountDeletion> {
        let id_text = id.to_string();
        let tx = self.conn.unchecked_transaction()?;

        let notes_removed = tx.execute("DELETE FROM notes WHERE owner_id = ?1;", [&id_text])?;
        let images_removed = tx.execute(
            "DELETE FROM profile_images WHERE owner_id = ?1;",
            [&id_text],
        )?;
        let accounts_removed = tx.execute("DELETE FROM accounts WHERE id = ?1;", [&id_text])?;
        if accounts_removed == 0 {
            // Dropping `tx` rolls back the note/image deletes.
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(AccountDeletion {
            notes_removed,
            images_removed,
        })
    }
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let id_text: String = row.get("id")?;
    Ok(Account {
        id: parse_uuid(&id_text, "accounts.id")?,
        user_name: row.get("user_name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        phone: row.get("phone")?,
        epoch: Epoch::from_millis(row.get("epoch_ms")?),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
