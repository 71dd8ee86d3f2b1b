//! In-Memory Storage Implementations
//!
//! Provides in-memory storage for testing and development.
//! Data is lost when the service restarts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{StorageError, StorageResult, StudentStore, VendorStore};
use crate::types::{Student, Vendor};

/// In-memory vendor store
///
/// Thread-safe storage for vendor accounts.
/// Uses Arc<RwLock<>> for concurrent access.
#[derive(Clone, Default)]
pub struct MemoryVendorStore {
    /// Vendors indexed by ID
    records: Arc<RwLock<HashMap<String, Vendor>>>,
    /// Index: email -> vendor ID
    by_email: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryVendorStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VendorStore for MemoryVendorStore {
    async fn insert(&self, vendor: &Vendor) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let mut by_email = self.by_email.write().await;

        if records.contains_key(&vendor.id) {
            return Err(StorageError::Duplicate(format!("vendor {}", vendor.id)));
        }

        if by_email.contains_key(&vendor.email) {
            return Err(StorageError::Duplicate(format!("email {}", vendor.email)));
        }

        by_email.insert(vendor.email.clone(), vendor.id.clone());
        records.insert(vendor.id.clone(), vendor.clone());

        Ok(())
    }

    async fn update(&self, vendor: &Vendor) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let mut by_email = self.by_email.write().await;

        let previous_email = match records.get(&vendor.id) {
            Some(existing) => existing.email.clone(),
            None => return Err(StorageError::NotFound(format!("vendor {}", vendor.id))),
        };

        if previous_email != vendor.email {
            if let Some(owner) = by_email.get(&vendor.email) {
                if owner != &vendor.id {
                    return Err(StorageError::Duplicate(format!("email {}", vendor.email)));
                }
            }
            by_email.remove(&previous_email);
            by_email.insert(vendor.email.clone(), vendor.id.clone());
        }

        records.insert(vendor.id.clone(), vendor.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> StorageResult<Option<Vendor>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> StorageResult<Option<Vendor>> {
        let by_email = self.by_email.read().await;
        let Some(id) = by_email.get(email).cloned() else {
            return Ok(None);
        };
        // Writers lock `records` first; never wait on it while holding the index
        drop(by_email);

        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }
}

/// In-memory student store
#[derive(Clone, Default)]
pub struct MemoryStudentStore {
    /// Records indexed by student ID
    records: Arc<RwLock<HashMap<String, Student>>>,
}

impl MemoryStudentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all vendors
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn insert(&self, student: &Student) -> StorageResult<()> {
        let mut records = self.records.write().await;

        if records.contains_key(&student.id) {
            return Err(StorageError::Duplicate(format!("student {}", student.id)));
        }

        records.insert(student.id.clone(), student.clone());
        Ok(())
    }

    async fn update(&self, student: &Student) -> StorageResult<()> {
        let mut records = self.records.write().await;

        match records.get_mut(&student.id) {
            Some(existing) if existing.vendor_id == student.vendor_id => {
                *existing = student.clone();
                Ok(())
            }
            _ => Err(StorageError::NotFound(format!("student {}", student.id))),
        }
    }

    async fn get_owned(&self, vendor_id: &str, id: &str) -> StorageResult<Option<Student>> {
        let records = self.records.read().await;
        Ok(records
            .get(id)
            .filter(|s| s.vendor_id == vendor_id)
            .cloned())
    }

    async fn list_by_vendor(&self, vendor_id: &str) -> StorageResult<Vec<Student>> {
        let records = self.records.read().await;
        let mut owned: Vec<Student> = records
            .values()
            .filter(|s| s.vendor_id == vendor_id)
            .cloned()
            .collect();

        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn delete_owned(&self, vendor_id: &str, id: &str) -> StorageResult<bool> {
        let mut records = self.records.write().await;

        let owned = records
            .get(id)
            .map(|s| s.vendor_id == vendor_id)
            .unwrap_or(false);

        if owned {
            records.remove(id);
        }

        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn vendor(email: &str) -> Vendor {
        Vendor::new("Test".into(), None, email.into(), "hash".into())
    }

    fn student(id: &str, vendor_id: &str) -> Student {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Student {
            id: id.into(),
            vendor_id: vendor_id.into(),
            name: "Asha".into(),
            phone: "123".into(),
            meals: "lunch".into(),
            total_amount: 1000.0,
            paid_amount: 300.0,
            pending_amount: 700.0,
            start_date: day,
            end_date: day,
            next_payment_date: day,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn test_vendor_insert_and_lookup() {
        let store = MemoryVendorStore::new();
        let v = vendor("a@example.com");
        store.insert(&v).await.unwrap();

        assert_eq!(store.get_by_id(&v.id).await.unwrap().unwrap().email, "a@example.com");
        assert_eq!(store.get_by_email("a@example.com").await.unwrap().unwrap().id, v.id);
        // Case-sensitive
        assert!(store.get_by_email("A@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_vendor_duplicate_email() {
        let store = MemoryVendorStore::new();
        store.insert(&vendor("a@example.com")).await.unwrap();

        let result = store.insert(&vendor("a@example.com")).await;
        assert!(matches!(result, Err(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_vendor_email_change_reindexes() {
        let store = MemoryVendorStore::new();
        let mut v = vendor("old@example.com");
        store.insert(&v).await.unwrap();
        store.insert(&vendor("taken@example.com")).await.unwrap();

        v.email = "taken@example.com".into();
        assert!(matches!(store.update(&v).await, Err(StorageError::Duplicate(_))));

        v.email = "new@example.com".into();
        store.update(&v).await.unwrap();
        assert!(store.get_by_email("old@example.com").await.unwrap().is_none());
        assert_eq!(store.get_by_email("new@example.com").await.unwrap().unwrap().id, v.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_email_lookup_during_insert_does_not_deadlock() {
        use std::time::Duration;

        let store = MemoryVendorStore::new();
        store.insert(&vendor("a@example.com")).await.unwrap();

        // Park the writer on `records` so the lookup queues up behind it
        let held = store.records.read().await;

        let writer = {
            let store = store.clone();
            tokio::spawn(async move { store.insert(&vendor("b@example.com")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let reader = {
            let store = store.clone();
            tokio::spawn(async move { store.get_by_email("a@example.com").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(held);

        let outcome = tokio::time::timeout(Duration::from_secs(3), async {
            (writer.await.unwrap(), reader.await.unwrap())
        })
        .await
        .expect("insert and get_by_email deadlocked");

        assert!(outcome.0.is_ok());
        assert!(outcome.1.unwrap().is_some());
        assert!(store.get_by_email("b@example.com").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_vendor_writes_and_lookups() {
        use std::time::Duration;

        let store = MemoryVendorStore::new();
        let mut tasks = Vec::new();

        for i in 0..32 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let mut v = vendor(&format!("v{}@example.com", i));
                store.insert(&v).await.unwrap();
                assert!(store.get_by_email(&v.email).await.unwrap().is_some());

                v.email = format!("renamed{}@example.com", i);
                store.update(&v).await.unwrap();
                store.get_by_email(&format!("v{}@example.com", (i + 1) % 32)).await.unwrap();
            }));
        }

        tokio::time::timeout(Duration::from_secs(10), async {
            for task in tasks {
                task.await.unwrap();
            }
        })
        .await
        .expect("concurrent vendor operations stalled");

        for i in 0..32 {
            let email = format!("renamed{}@example.com", i);
            assert!(store.get_by_email(&email).await.unwrap().is_some());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_student_access() {
        use std::time::Duration;

        let store = MemoryStudentStore::new();
        let mut tasks = Vec::new();

        for i in 0..32 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let vendor_id = format!("v{}", i % 4);
                let id = format!("s{}", i);
                store.insert(&student(&id, &vendor_id)).await.unwrap();
                store.list_by_vendor(&vendor_id).await.unwrap();
                if i % 2 == 0 {
                    assert!(store.delete_owned(&vendor_id, &id).await.unwrap());
                }
            }));
        }

        tokio::time::timeout(Duration::from_secs(10), async {
            for task in tasks {
                task.await.unwrap();
            }
        })
        .await
        .expect("concurrent student operations stalled");

        assert_eq!(store.len().await, 16);
    }

    #[tokio::test]
    async fn test_vendor_update_unknown() {
        let store = MemoryVendorStore::new();
        let result = store.update(&vendor("ghost@example.com")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_student_ownership_scoping() {
        let store = MemoryStudentStore::new();
        store.insert(&student("s1", "v1")).await.unwrap();
        store.insert(&student("s2", "v2")).await.unwrap();

        assert!(store.get_owned("v1", "s1").await.unwrap().is_some());
        assert!(store.get_owned("v1", "s2").await.unwrap().is_none());

        let listed = store.list_by_vendor("v1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "s1");

        // Cross-tenant update and delete behave like missing records
        let mut forged = student("s2", "v1");
        forged.name = "Hijacked".into();
        assert!(matches!(store.update(&forged).await, Err(StorageError::NotFound(_))));
        assert!(!store.delete_owned("v1", "s2").await.unwrap());
        assert_eq!(store.get_owned("v2", "s2").await.unwrap().unwrap().name, "Asha");
    }

    #[tokio::test]
    async fn test_student_delete_twice() {
        let store = MemoryStudentStore::new();
        store.insert(&student("s1", "v1")).await.unwrap();

        assert!(store.delete_owned("v1", "s1").await.unwrap());
        assert!(!store.delete_owned("v1", "s1").await.unwrap());
        assert_eq!(store.len().await, 0);
    }
}
