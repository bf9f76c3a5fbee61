//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD, name search and duplicate lookup over `contacts`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Contact::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - List order is ascending `id`, so pages never overlap.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::contact::{Address, Contact, ContactId, ContactValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    name,
    phone,
    email,
    address1,
    address2,
    address3,
    postal_code,
    note
FROM contacts";

const REQUIRED_COLUMNS: [&str; 9] = [
    "id",
    "name",
    "phone",
    "email",
    "address1",
    "address2",
    "address3",
    "postal_code",
    "note",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    Db(DbError),
    NotFound(ContactId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}; open it with open_db()"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactListQuery {
    /// Case-insensitive substring filter on `name`. `None` lists everything.
    pub name_contains: Option<String>,
    /// Maximum rows to return. `None` means unbounded.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u64,
}

/// Record store contract consumed by the contact service.
pub trait ContactRepository {
    /// Inserts a new record and returns the store-assigned id.
    ///
    /// Any `id` already present on `contact` is ignored.
    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId>;
    /// Replaces every non-id field of the record named by `contact.id`.
    fn update_contact(&self, contact: &Contact) -> RepoResult<()>;
    /// Replaces only the address lines and postal code of one record.
    fn update_address(&self, id: ContactId, address: &Address) -> RepoResult<()>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    fn contact_exists(&self, id: ContactId) -> RepoResult<bool>;
    /// Returns the id of a live record that counts as a duplicate of
    /// `contact`: same trimmed name ignoring ASCII case, and same phone.
    fn find_duplicate(&self, contact: &Contact) -> RepoResult<Option<ContactId>>;
    fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>>;
    fn delete_contact(&self, id: ContactId) -> RepoResult<()>;
    fn count_contacts(&self) -> RepoResult<u64>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema does
    ///   not carry the `contacts` shape this repository reads.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_contact_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
        contact.validate()?;

        self.conn.execute(
            "INSERT INTO contacts (
                name,
                phone,
                email,
                address1,
                address2,
                address3,
                postal_code,
                note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                contact.name.as_str(),
                contact.phone.as_deref(),
                contact.email.as_deref(),
                contact.address1.as_deref(),
                contact.address2.as_deref(),
                contact.address3.as_deref(),
                contact.postal_code.as_deref(),
                contact.note.as_deref(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_contact(&self, contact: &Contact) -> RepoResult<()> {
        contact.validate()?;
        let id = contact.id.ok_or_else(|| {
            RepoError::InvalidData("cannot update a contact without an id".to_string())
        })?;

        let changed = self.conn.execute(
            "UPDATE contacts
             SET
                name = ?1,
                phone = ?2,
                email = ?3,
                address1 = ?4,
                address2 = ?5,
                address3 = ?6,
                postal_code = ?7,
                note = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?9;",
            params![
                contact.name.as_str(),
                contact.phone.as_deref(),
                contact.email.as_deref(),
                contact.address1.as_deref(),
                contact.address2.as_deref(),
                contact.address3.as_deref(),
                contact.postal_code.as_deref(),
                contact.note.as_deref(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn update_address(&self, id: ContactId, address: &Address) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE contacts
             SET
                address1 = ?1,
                address2 = ?2,
                address3 = ?3,
                postal_code = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?5;",
            params![
                address.address1.as_deref(),
                address.address2.as_deref(),
                address.address3.as_deref(),
                address.postal_code.as_deref(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }

        Ok(None)
    }

    fn contact_exists(&self, id: ContactId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contacts WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_duplicate(&self, contact: &Contact) -> RepoResult<Option<ContactId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id
             FROM contacts
             WHERE lower(trim(name)) = lower(trim(?1))
               AND phone IS ?2
             ORDER BY id ASC
             LIMIT 1;",
        )?;

        let mut rows = stmt.query(params![contact.name.as_str(), contact.phone.as_deref()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }

        Ok(None)
    }

    fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>> {
        let mut sql = format!("{CONTACT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = query.name_contains.as_ref() {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(format!("%{}%", escape_like(name))));
        }

        sql.push_str(" ORDER BY id ASC");

        match query.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
            }
            None if query.offset > 0 => sql.push_str(" LIMIT -1"),
            None => {}
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(offset_to_sql(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut contacts = Vec::new();

        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }

        Ok(contacts)
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn count_contacts(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative contact count `{count}`")))
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let contact = Contact {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        address1: row.get("address1")?,
        address2: row.get("address2")?,
        address3: row.get("address3")?,
        postal_code: row.get("postal_code")?,
        note: row.get("note")?,
    };

    // Address-only updates skip validation, so only the fields the write
    // paths guard are checked here.
    if contact.name.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "blank name in contacts.name for id {}",
            contact.id.unwrap_or_default()
        )));
    }
    Ok(contact)
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn offset_to_sql(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

fn ensure_contact_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "contacts")? {
        return Err(RepoError::MissingRequiredTable("contacts"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "contacts", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "contacts",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_protects_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
