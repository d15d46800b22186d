//! HR module: employee records, their repository and dashboard stats.

mod employee;
mod error;
pub mod form;
mod ids;
mod repository;
mod stats;

use std::sync::Arc;

use chrono::NaiveDate;
use platform_db::KeyValueStore;
use serde::Serialize;

pub use employee::{Department, Employee, EmployeeDraft, EmployeeStatus};
pub use error::{HrError, HrResult};
pub use form::{EmployeeForm, FormError, FormField};
pub use ids::IdGenerator;
pub use repository::{EMPLOYEES_KEY, EmployeeRepository};
pub use stats::{Stats, compute_stats};

/// How many records the dashboard lists under "Recent Employees".
pub const RECENT_LIMIT: usize = 5;

/// Data behind the dashboard page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub stats: Stats,
    pub recent: Vec<Employee>,
}

/// Entry point shared by the HTTP views, GraphQL and the CLI.
#[derive(Clone)]
pub struct HrModule {
    employees: EmployeeRepository,
}

impl HrModule {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            employees: EmployeeRepository::new(store),
        }
    }

    pub fn employees(&self) -> &EmployeeRepository {
        &self.employees
    }

    /// Stats and recent records come from a single read of the store.
    pub async fn dashboard(&self, reference: NaiveDate) -> HrResult<Dashboard> {
        let employees = self.employees.list().await?;
        let stats = compute_stats(&employees, reference);
        let recent = repository::newest_first(employees, RECENT_LIMIT);
        Ok(Dashboard { stats, recent })
    }

    /// Validates a submitted form and stores the resulting record.
    pub async fn submit(&self, form: &EmployeeForm) -> Result<Employee, SubmitError> {
        let draft = form.validate()?;
        Ok(self.employees.add(draft).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error(transparent)]
    Storage(#[from] HrError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use platform_db::MemoryStore;

    fn module() -> HrModule {
        HrModule::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn empty_dashboard_is_all_zero() {
        let dashboard = module().dashboard(Local::now().date_naive()).await.unwrap();
        assert_eq!(dashboard.stats, Stats::default());
        assert!(dashboard.recent.is_empty());
    }

    #[tokio::test]
    async fn default_hire_date_counts_as_new_this_month() {
        let hr = module();
        let form = EmployeeForm {
            name: "Ann Lee".into(),
            email: "ann@x.com".into(),
            department: "Engineering".into(),
            position: "Engineer".into(),
            status: "Active".into(),
            ..Default::default()
        };
        let created = hr.submit(&form).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.hire_date, Local::now().date_naive());
        assert_eq!(created.status, EmployeeStatus::Active);

        let dashboard = hr.dashboard(Local::now().date_naive()).await.unwrap();
        assert_eq!(dashboard.stats.total_employees, 1);
        assert_eq!(dashboard.stats.active_employees, 1);
        assert_eq!(dashboard.stats.departments, 1);
        assert_eq!(dashboard.stats.new_this_month, 1);
        assert_eq!(dashboard.recent, vec![created]);
    }

    #[tokio::test]
    async fn invalid_submission_stores_nothing() {
        let hr = module();
        let err = hr.submit(&EmployeeForm::default()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert!(hr.employees().list().await.unwrap().is_empty());
    }
}
