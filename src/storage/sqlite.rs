//! SQLite Persistent Storage for Vendors and Students
//!
//! Provides durable storage that survives service restarts.
//! Uses connection pooling via r2d2 for concurrent access.

use async_trait::async_trait;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;

use super::traits::{StorageError, StorageResult, StudentStore, VendorStore};
use crate::types::{Student, Vendor};

/// Dates are stored as ISO `YYYY-MM-DD` text.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed vendor and student store with connection pooling
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Create a new store with the given database path
    ///
    /// Creates the database file and tables if needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Connection(format!(
                    "cannot create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Get a connection from the pool
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        self.pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Create tables and indexes if they do not exist yet
    fn ensure_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS vendors (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                restaurant TEXT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                vendor_id TEXT NOT NULL REFERENCES vendors(id),
                name TEXT NOT NULL,
                phone TEXT NOT NULL,
                meals TEXT NOT NULL,
                total_amount REAL NOT NULL,
                paid_amount REAL NOT NULL,
                pending_amount REAL NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                next_payment_date TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_students_vendor_id ON students(vendor_id);
            "#,
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    /// Convert a database row to Vendor
    fn row_to_vendor(row: &rusqlite::Row) -> rusqlite::Result<Vendor> {
        Ok(Vendor {
            id: row.get("id")?,
            name: row.get("name")?,
            restaurant: row.get("restaurant")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Convert a database row to Student
    fn row_to_student(row: &rusqlite::Row) -> rusqlite::Result<Student> {
        Ok(Student {
            id: row.get("id")?,
            vendor_id: row.get("vendor_id")?,
            name: row.get("name")?,
            phone: row.get("phone")?,
            meals: row.get("meals")?,
            total_amount: row.get("total_amount")?,
            paid_amount: row.get("paid_amount")?,
            pending_amount: row.get("pending_amount")?,
            start_date: read_date(row, "start_date")?,
            end_date: read_date(row, "end_date")?,
            next_payment_date: read_date(row, "next_payment_date")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    // Synchronous helper methods for the trait implementations

    fn insert_vendor_sync(&self, vendor: &Vendor) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO vendors (
                id, name, restaurant, email, password_hash, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                vendor.id,
                vendor.name,
                vendor.restaurant,
                vendor.email,
                vendor.password_hash,
                vendor.created_at,
                vendor.updated_at,
            ],
        )
        .map_err(|e| map_constraint(e, format!("email {}", vendor.email)))?;

        Ok(())
    }

    fn update_vendor_sync(&self, vendor: &Vendor) -> Result<(), StorageError> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                r#"
            UPDATE vendors SET
                name = ?2,
                restaurant = ?3,
                email = ?4,
                password_hash = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
                params![
                    vendor.id,
                    vendor.name,
                    vendor.restaurant,
                    vendor.email,
                    vendor.password_hash,
                    vendor.updated_at,
                ],
            )
            .map_err(|e| map_constraint(e, format!("email {}", vendor.email)))?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(format!("vendor {}", vendor.id)));
        }

        Ok(())
    }

    fn get_vendor_sync(&self, column: &str, value: &str) -> Result<Option<Vendor>, StorageError> {
        let conn = self.conn()?;

        let sql = match column {
            "id" => "SELECT * FROM vendors WHERE id = ?1",
            "email" => "SELECT * FROM vendors WHERE email = ?1",
            other => {
                return Err(StorageError::InvalidData(format!(
                    "unsupported vendor lookup column: {}",
                    other
                )))
            }
        };

        conn.query_row(sql, params![value], |row| Self::row_to_vendor(row))
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn insert_student_sync(&self, student: &Student) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO students (
                id, vendor_id, name, phone, meals,
                total_amount, paid_amount, pending_amount,
                start_date, end_date, next_payment_date,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
            params![
                student.id,
                student.vendor_id,
                student.name,
                student.phone,
                student.meals,
                student.total_amount,
                student.paid_amount,
                student.pending_amount,
                format_date(student.start_date),
                format_date(student.end_date),
                format_date(student.next_payment_date),
                student.created_at,
                student.updated_at,
            ],
        )
        .map_err(|e| map_constraint(e, format!("student {}", student.id)))?;

        Ok(())
    }

    fn update_student_sync(&self, student: &Student) -> Result<(), StorageError> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                r#"
            UPDATE students SET
                name = ?3,
                phone = ?4,
                meals = ?5,
                total_amount = ?6,
                paid_amount = ?7,
                pending_amount = ?8,
                start_date = ?9,
                end_date = ?10,
                next_payment_date = ?11,
                updated_at = ?12
            WHERE id = ?1 AND vendor_id = ?2
            "#,
                params![
                    student.id,
                    student.vendor_id,
                    student.name,
                    student.phone,
                    student.meals,
                    student.total_amount,
                    student.paid_amount,
                    student.pending_amount,
                    format_date(student.start_date),
                    format_date(student.end_date),
                    format_date(student.next_payment_date),
                    student.updated_at,
                ],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(StorageError::NotFound(format!("student {}", student.id)));
        }

        Ok(())
    }

    fn get_student_sync(&self, vendor_id: &str, id: &str) -> Result<Option<Student>, StorageError> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM students WHERE id = ?1 AND vendor_id = ?2",
            params![id, vendor_id],
            |row| Self::row_to_student(row),
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn list_students_sync(&self, vendor_id: &str) -> Result<Vec<Student>, StorageError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT * FROM students WHERE vendor_id = ?1 ORDER BY created_at ASC, id ASC")
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let records = stmt
            .query_map(params![vendor_id], |row| Self::row_to_student(row))
            .map_err(|e| StorageError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(records)
    }

    fn delete_student_sync(&self, vendor_id: &str, id: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                "DELETE FROM students WHERE id = ?1 AND vendor_id = ?2",
                params![id, vendor_id],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn read_date(row: &rusqlite::Row, column: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(column)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Map primary-key and unique violations to `Duplicate`
fn map_constraint(e: rusqlite::Error, what: String) -> StorageError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        // SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE
        if err.extended_code == 1555 || err.extended_code == 2067 {
            return StorageError::Duplicate(what);
        }
    }
    StorageError::Database(e.to_string())
}

#[async_trait]
impl VendorStore for SqliteStore {
    async fn insert(&self, vendor: &Vendor) -> StorageResult<()> {
        self.insert_vendor_sync(vendor)
    }

    async fn update(&self, vendor: &Vendor) -> StorageResult<()> {
        self.update_vendor_sync(vendor)
    }

    async fn get_by_id(&self, id: &str) -> StorageResult<Option<Vendor>> {
        self.get_vendor_sync("id", id)
    }

    async fn get_by_email(&self, email: &str) -> StorageResult<Option<Vendor>> {
        self.get_vendor_sync("email", email)
    }
}

#[async_trait]
impl StudentStore for SqliteStore {
    async fn insert(&self, student: &Student) -> StorageResult<()> {
        self.insert_student_sync(student)
    }

    async fn update(&self, student: &Student) -> StorageResult<()> {
        self.update_student_sync(student)
    }

    async fn get_owned(&self, vendor_id: &str, id: &str) -> StorageResult<Option<Student>> {
        self.get_student_sync(vendor_id, id)
    }

    async fn list_by_vendor(&self, vendor_id: &str) -> StorageResult<Vec<Student>> {
        self.list_students_sync(vendor_id)
    }

    async fn delete_owned(&self, vendor_id: &str, id: &str) -> StorageResult<bool> {
        self.delete_student_sync(vendor_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_vendor(email: &str) -> Vendor {
        Vendor::new("Ravi".into(), Some("Ravi's Mess".into()), email.into(), "hash".into())
    }

    fn create_student(id: &str, vendor_id: &str) -> Student {
        Student {
            id: id.into(),
            vendor_id: vendor_id.into(),
            name: "Asha".into(),
            phone: "9876543210".into(),
            meals: "lunch+dinner".into(),
            total_amount: 1000.0,
            paid_amount: 300.0,
            pending_amount: 700.0,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            next_payment_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_vendor_insert_and_get() {
        let store = SqliteStore::in_memory().unwrap();
        let vendor = create_vendor("ravi@example.com");

        VendorStore::insert(&store, &vendor).await.unwrap();

        let by_id = store.get_by_id(&vendor.id).await.unwrap().unwrap();
        assert_eq!(by_id, vendor);

        let by_email = store.get_by_email("ravi@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, vendor.id);
        assert!(store.get_by_email("RAVI@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = SqliteStore::in_memory().unwrap();

        VendorStore::insert(&store, &create_vendor("same@example.com"))
            .await
            .unwrap();
        let result = VendorStore::insert(&store, &create_vendor("same@example.com")).await;

        assert!(matches!(result, Err(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_vendor_update_conflicting_email() {
        let store = SqliteStore::in_memory().unwrap();
        let mut first = create_vendor("first@example.com");
        VendorStore::insert(&store, &first).await.unwrap();
        VendorStore::insert(&store, &create_vendor("second@example.com"))
            .await
            .unwrap();

        first.email = "second@example.com".into();
        let result = VendorStore::update(&store, &first).await;
        assert!(matches!(result, Err(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_student_roundtrip_and_scoping() {
        let store = SqliteStore::in_memory().unwrap();
        let owner = create_vendor("owner@example.com");
        let other = create_vendor("other@example.com");
        VendorStore::insert(&store, &owner).await.unwrap();
        VendorStore::insert(&store, &other).await.unwrap();

        let student = create_student("s1", &owner.id);
        StudentStore::insert(&store, &student).await.unwrap();

        let fetched = store.get_owned(&owner.id, "s1").await.unwrap().unwrap();
        assert_eq!(fetched, student);

        assert!(store.get_owned(&other.id, "s1").await.unwrap().is_none());
        assert!(store.list_by_vendor(&other.id).await.unwrap().is_empty());
        assert_eq!(store.list_by_vendor(&owner.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_student_update_requires_owner() {
        let store = SqliteStore::in_memory().unwrap();
        let owner = create_vendor("owner@example.com");
        let other = create_vendor("other@example.com");
        VendorStore::insert(&store, &owner).await.unwrap();
        VendorStore::insert(&store, &other).await.unwrap();

        let mut student = create_student("s1", &owner.id);
        StudentStore::insert(&store, &student).await.unwrap();

        student.paid_amount = 1000.0;
        student.pending_amount = 0.0;
        StudentStore::update(&store, &student).await.unwrap();
        let fetched = store.get_owned(&owner.id, "s1").await.unwrap().unwrap();
        assert_eq!(fetched.pending_amount, 0.0);

        let mut forged = student.clone();
        forged.vendor_id = other.id.clone();
        let result = StudentStore::update(&store, &forged).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_student_delete() {
        let store = SqliteStore::in_memory().unwrap();
        let owner = create_vendor("owner@example.com");
        VendorStore::insert(&store, &owner).await.unwrap();
        StudentStore::insert(&store, &create_student("s1", &owner.id))
            .await
            .unwrap();

        assert!(!store.delete_owned("someone-else", "s1").await.unwrap());
        assert!(store.delete_owned(&owner.id, "s1").await.unwrap());
        assert!(!store.delete_owned(&owner.id, "s1").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.db");
        let vendor = create_vendor("persist@example.com");

        {
            let store = SqliteStore::new(&path).unwrap();
            VendorStore::insert(&store, &vendor).await.unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        let fetched = reopened.get_by_email("persist@example.com").await.unwrap();
        assert_eq!(fetched.map(|v| v.id), Some(vendor.id));
    }

    #[test]
    fn test_unusable_parent_directory_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        match SqliteStore::new(blocker.join("sub").join("ledger.db")) {
            Err(StorageError::Connection(msg)) => {
                assert!(msg.contains("cannot create database directory"), "{}", msg)
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("store opened under a regular file"),
        }
    }
}
