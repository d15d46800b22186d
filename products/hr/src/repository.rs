use std::sync::Arc;

use chrono::{Local, NaiveDate};
use platform_db::{DbError, KeyValueStore};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{Employee, EmployeeDraft, EmployeeStatus, HrResult, IdGenerator};

/// Store key holding the JSON array of employees.
pub const EMPLOYEES_KEY: &str = "employees";

/// Read-modify-write access to the persisted employee list.
///
/// Nothing is cached: every call re-reads the store, so all views observe
/// the latest persisted state. Mutations inside one process are serialized;
/// separate processes sharing a store still race and the last write wins.
#[derive(Clone)]
pub struct EmployeeRepository {
    store: Arc<dyn KeyValueStore>,
    ids: Arc<IdGenerator>,
    write_lock: Arc<Mutex<()>>,
}

impl EmployeeRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ids: Arc::new(IdGenerator::new()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Absent or unparseable payloads read as an empty list. Array entries
    /// that are not valid employee records are skipped here but kept in the
    /// store.
    pub async fn list(&self) -> HrResult<Vec<Employee>> {
        Ok(self.load().await?.into_employees())
    }

    pub async fn get(&self, id: u64) -> HrResult<Option<Employee>> {
        Ok(self.list().await?.into_iter().find(|employee| employee.id == id))
    }

    /// The last `limit` stored records, newest first.
    pub async fn recent(&self, limit: usize) -> HrResult<Vec<Employee>> {
        Ok(newest_first(self.list().await?, limit))
    }

    /// Appends a new record. A missing hire date becomes today's local date,
    /// the same calendar the dashboard counts "new this month" against.
    #[instrument(name = "hr.employees.add", skip_all)]
    pub async fn add(&self, draft: EmployeeDraft) -> HrResult<Employee> {
        self.add_on(draft, Local::now().date_naive()).await
    }

    pub async fn add_on(&self, draft: EmployeeDraft, today: NaiveDate) -> HrResult<Employee> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.load().await?;
        let employee = draft.into_employee(self.ids.next_id(stored.max_id()), today);
        stored.entries.push(StoredEntry::Employee(employee.clone()));
        self.persist(&stored).await?;
        info!(
            employee_id = employee.id,
            department = %employee.department,
            total = stored.entries.len(),
            "employee added"
        );
        Ok(employee)
    }

    /// Returns `false`, writing nothing, when no record has this id.
    #[instrument(name = "hr.employees.update_status", skip(self))]
    pub async fn update_status(&self, id: u64, status: EmployeeStatus) -> HrResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.load().await?;
        let Some(record) = stored.employee_mut(id) else {
            debug!("status update ignored; employee not found");
            return Ok(false);
        };
        record.status = status;
        self.persist(&stored).await?;
        info!("employee status updated");
        Ok(true)
    }

    /// Returns `false`, writing nothing, when no record has this id.
    #[instrument(name = "hr.employees.remove", skip(self))]
    pub async fn remove(&self, id: u64) -> HrResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.load().await?;
        let before = stored.entries.len();
        stored
            .entries
            .retain(|entry| !matches!(entry, StoredEntry::Employee(employee) if employee.id == id));
        if stored.entries.len() == before {
            debug!("remove ignored; employee not found");
            return Ok(false);
        }
        self.persist(&stored).await?;
        info!(remaining = stored.entries.len(), "employee removed");
        Ok(true)
    }

    /// Drops the stored list entirely.
    pub async fn clear(&self) -> HrResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(EMPLOYEES_KEY).await?;
        info!("employee list cleared");
        Ok(())
    }

    async fn load(&self) -> HrResult<StoredList> {
        match self.store.get(EMPLOYEES_KEY).await {
            Ok(raw) => Ok(StoredList::decode(raw.as_deref())),
            Err(DbError::InvalidUtf8(key)) => {
                warn!(key = %key, "stored employee list is not UTF-8; treating as empty");
                Ok(StoredList::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn persist(&self, stored: &StoredList) -> HrResult<()> {
        let payload = serde_json::to_string(&stored.entries)?;
        self.store.set(EMPLOYEES_KEY, &payload).await?;
        Ok(())
    }
}

/// The last `limit` records of `employees`, newest first.
pub(crate) fn newest_first(employees: Vec<Employee>, limit: usize) -> Vec<Employee> {
    employees.into_iter().rev().take(limit).collect()
}

/// One element of the persisted array. Anything that does not decode as an
/// [`Employee`] is carried as raw JSON and written back unchanged.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Employee(Employee),
    Raw(serde_json::Value),
}

#[derive(Debug, Default)]
struct StoredList {
    entries: Vec<StoredEntry>,
}

impl StoredList {
    fn decode(raw: Option<&str>) -> Self {
        let Some(text) = raw else {
            return Self::default();
        };
        let entries: Vec<StoredEntry> = match serde_json::from_str(text) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "stored employee list is not a JSON array; treating as empty");
                return Self::default();
            }
        };
        let skipped = entries
            .iter()
            .filter(|entry| matches!(entry, StoredEntry::Raw(_)))
            .count();
        if skipped > 0 {
            warn!(skipped, "stored entries are not valid employee records; keeping them as-is");
        }
        Self { entries }
    }

    /// Largest id in the array, including ids of entries kept as raw JSON.
    fn max_id(&self) -> Option<u64> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                StoredEntry::Employee(employee) => Some(employee.id),
                StoredEntry::Raw(value) => value.get("id").and_then(serde_json::Value::as_u64),
            })
            .max()
    }

    fn employee_mut(&mut self, id: u64) -> Option<&mut Employee> {
        self.entries.iter_mut().find_map(|entry| match entry {
            StoredEntry::Employee(employee) if employee.id == id => Some(employee),
            _ => None,
        })
    }

    fn into_employees(self) -> Vec<Employee> {
        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                StoredEntry::Employee(employee) => Some(employee),
                StoredEntry::Raw(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_db::MemoryStore;
    use serde_json::json;

    fn repository() -> EmployeeRepository {
        EmployeeRepository::new(Arc::new(MemoryStore::new()))
    }

    fn draft(name: &str, department: &str) -> EmployeeDraft {
        EmployeeDraft {
            name: name.into(),
            email: format!("{}@example.test", name.to_lowercase().replace(' ', ".")),
            department: department.into(),
            position: "Engineer".into(),
            ..Default::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let repo = repository();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.recent(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_array_payload_lists_as_empty() {
        for payload in ["not json", "{\"id\": 1}", "\"employees\""] {
            let store = MemoryStore::with_entry(EMPLOYEES_KEY, payload);
            let repo = EmployeeRepository::new(Arc::new(store));
            assert!(repo.list().await.unwrap().is_empty(), "payload {payload}");
        }
    }

    #[tokio::test]
    async fn off_shape_records_survive_writes() {
        let ann = json!({
            "id": 1, "name": "Ann", "email": "ann@x.com", "phone": "",
            "department": "Engineering", "position": "Engineer",
            "hireDate": "2026-10-02", "salary": "85000", "status": "Active"
        });
        let bo = json!({
            "id": 9_000_000_000_000u64, "name": "Bo", "email": "bo@x.com",
            "department": "Sales", "position": "Rep",
            "hireDate": "2026-10-03", "salary": 90000, "status": "active"
        });
        let store = Arc::new(MemoryStore::with_entry(
            EMPLOYEES_KEY,
            json!([ann, bo]).to_string(),
        ));
        let repo = EmployeeRepository::new(store.clone());

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Ann");

        let cy = repo.add_on(draft("Cy", "HR"), day(2026, 10, 16)).await.unwrap();
        assert!(cy.id > 9_000_000_000_000);
        assert!(repo.update_status(1, EmployeeStatus::Inactive).await.unwrap());

        let raw = store.get(EMPLOYEES_KEY).await.unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let stored = stored.as_array().unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0]["name"], "Ann");
        assert_eq!(stored[0]["status"], "Inactive");
        assert_eq!(stored[1], bo);
        assert_eq!(stored[2]["name"], "Cy");
    }

    #[tokio::test]
    async fn add_preserves_draft_fields_and_defaults_hire_date() {
        let repo = repository();
        let mut input = draft("Ann Lee", "Engineering");
        input.phone = "555-0100".into();
        input.salary = "85000".into();
        input.status = EmployeeStatus::Pending;

        let created = repo.add_on(input.clone(), day(2026, 10, 16)).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.hire_date, day(2026, 10, 16));

        let listed = repo.list().await.unwrap();
        assert_eq!(listed, vec![created.clone()]);
        assert_eq!(created.name, input.name);
        assert_eq!(created.email, input.email);
        assert_eq!(created.phone, "555-0100");
        assert_eq!(created.salary, "85000");
        assert_eq!(created.status, EmployeeStatus::Pending);
    }

    #[tokio::test]
    async fn explicit_hire_date_is_kept() {
        let repo = repository();
        let mut input = draft("Bo Chen", "Sales");
        input.hire_date = Some(day(2024, 2, 29));
        let created = repo.add_on(input, day(2026, 10, 16)).await.unwrap();
        assert_eq!(created.hire_date, day(2024, 2, 29));
    }

    #[tokio::test]
    async fn back_to_back_adds_get_distinct_increasing_ids() {
        let repo = repository();
        let first = repo.add(draft("A", "Sales")).await.unwrap();
        let second = repo.add(draft("B", "Sales")).await.unwrap();
        assert!(second.id > first.id);
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_status_touches_only_the_target() {
        let repo = repository();
        let a = repo.add(draft("A", "Sales")).await.unwrap();
        let b = repo.add(draft("B", "HR")).await.unwrap();

        assert!(repo.update_status(a.id, EmployeeStatus::Inactive).await.unwrap());

        let listed = repo.list().await.unwrap();
        let expected_a = Employee {
            status: EmployeeStatus::Inactive,
            ..a
        };
        assert_eq!(listed, vec![expected_a, b]);
    }

    #[tokio::test]
    async fn unknown_ids_are_silent_noops() {
        let repo = repository();
        let a = repo.add(draft("A", "Sales")).await.unwrap();
        let before = repo.list().await.unwrap();

        assert!(!repo.update_status(a.id + 1, EmployeeStatus::Pending).await.unwrap());
        assert!(!repo.remove(a.id + 1).await.unwrap());
        assert_eq!(repo.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn remove_twice_matches_remove_once() {
        let repo = repository();
        let a = repo.add(draft("A", "Sales")).await.unwrap();
        let b = repo.add(draft("B", "Sales")).await.unwrap();

        assert!(repo.remove(a.id).await.unwrap());
        let once = repo.list().await.unwrap();
        assert!(!repo.remove(a.id).await.unwrap());
        assert_eq!(repo.list().await.unwrap(), once);
        assert_eq!(once, vec![b]);
    }

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let repo = repository();
        for n in 0..7 {
            repo.add(draft(&format!("E{n}"), "Finance")).await.unwrap();
        }
        let recent: Vec<_> = repo
            .recent(5)
            .await
            .unwrap()
            .into_iter()
            .map(|employee| employee.name)
            .collect();
        assert_eq!(recent, ["E6", "E5", "E4", "E3", "E2"]);
    }

    #[tokio::test]
    async fn get_and_clear() {
        let repo = repository();
        let a = repo.add(draft("A", "Sales")).await.unwrap();
        assert_eq!(repo.get(a.id).await.unwrap(), Some(a.clone()));
        repo.clear().await.unwrap();
        assert_eq!(repo.get(a.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_adds_do_not_lose_writes() {
        let repo = repository();
        let mut handles = Vec::new();
        for n in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.add(draft(&format!("E{n}"), "Operations")).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(repo.list().await.unwrap().len(), 16);
    }
}
