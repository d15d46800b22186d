use async_graphql::{Context, Enum, ErrorExtensions, ID, InputObject, Object, SimpleObject};
use chrono::{Local, NaiveDate};
use platform_api::{ApiError, internal_error};
use products_hr::{
    Dashboard, Employee, EmployeeForm, EmployeeStatus, HrError, HrModule, Stats, SubmitError,
};
use tracing::instrument;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusValue {
    Active,
    Inactive,
    Pending,
}

impl From<EmployeeStatus> for StatusValue {
    fn from(value: EmployeeStatus) -> Self {
        match value {
            EmployeeStatus::Active => StatusValue::Active,
            EmployeeStatus::Inactive => StatusValue::Inactive,
            EmployeeStatus::Pending => StatusValue::Pending,
        }
    }
}

impl From<StatusValue> for EmployeeStatus {
    fn from(value: StatusValue) -> Self {
        match value {
            StatusValue::Active => EmployeeStatus::Active,
            StatusValue::Inactive => EmployeeStatus::Inactive,
            StatusValue::Pending => EmployeeStatus::Pending,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct EmployeeNode {
    pub id: ID,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    pub hire_date: NaiveDate,
    pub salary: String,
    pub status: StatusValue,
}

impl From<Employee> for EmployeeNode {
    fn from(value: Employee) -> Self {
        Self {
            id: ID(value.id.to_string()),
            name: value.name,
            email: value.email,
            phone: value.phone,
            department: value.department,
            position: value.position,
            hire_date: value.hire_date,
            salary: value.salary,
            status: value.status.into(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct StatsNode {
    pub total_employees: u64,
    pub active_employees: u64,
    pub departments: u64,
    pub new_this_month: u64,
}

impl From<Stats> for StatsNode {
    fn from(value: Stats) -> Self {
        Self {
            total_employees: value.total_employees as u64,
            active_employees: value.active_employees as u64,
            departments: value.departments as u64,
            new_this_month: value.new_this_month as u64,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DashboardNode {
    pub stats: StatsNode,
    pub recent: Vec<EmployeeNode>,
}

impl From<Dashboard> for DashboardNode {
    fn from(value: Dashboard) -> Self {
        Self {
            stats: value.stats.into(),
            recent: value.recent.into_iter().map(EmployeeNode::from).collect(),
        }
    }
}

/// Same fields and validation as the HTML add form.
#[derive(Clone, Debug, InputObject)]
pub struct AddEmployeeInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: String,
    pub position: String,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<String>,
    pub status: Option<StatusValue>,
}

impl From<AddEmployeeInput> for EmployeeForm {
    fn from(value: AddEmployeeInput) -> Self {
        let status = value.status.map(EmployeeStatus::from).unwrap_or_default();
        Self {
            name: value.name,
            email: value.email,
            phone: value.phone.unwrap_or_default(),
            department: value.department,
            position: value.position,
            hire_date: value
                .hire_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            salary: value.salary.unwrap_or_default(),
            status: status.as_str().to_string(),
        }
    }
}

#[derive(Default)]
pub struct HrQuery;

#[derive(Default)]
pub struct HrMutation;

#[Object]
impl HrQuery {
    #[instrument(name = "graphql.hr.employees", skip_all)]
    async fn employees(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<EmployeeNode>> {
        let hr = ctx.data::<HrModule>()?;
        let employees = hr.employees().list().await.map_err(storage_error)?;
        Ok(employees.into_iter().map(EmployeeNode::from).collect())
    }

    async fn employee(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<EmployeeNode>> {
        let hr = ctx.data::<HrModule>()?;
        let id = parse_id(&id)?;
        let employee = hr.employees().get(id).await.map_err(storage_error)?;
        Ok(employee.map(EmployeeNode::from))
    }

    /// Stats are computed against `on`, defaulting to today's local date.
    #[instrument(name = "graphql.hr.dashboard", skip_all)]
    async fn dashboard(
        &self,
        ctx: &Context<'_>,
        on: Option<NaiveDate>,
    ) -> async_graphql::Result<DashboardNode> {
        let hr = ctx.data::<HrModule>()?;
        let reference = on.unwrap_or_else(|| Local::now().date_naive());
        let dashboard = hr.dashboard(reference).await.map_err(storage_error)?;
        Ok(dashboard.into())
    }
}

#[Object]
impl HrMutation {
    #[instrument(name = "graphql.hr.add_employee", skip_all)]
    async fn add_employee(
        &self,
        ctx: &Context<'_>,
        input: AddEmployeeInput,
    ) -> async_graphql::Result<EmployeeNode> {
        let hr = ctx.data::<HrModule>()?;
        let form = EmployeeForm::from(input);
        match hr.submit(&form).await {
            Ok(employee) => Ok(employee.into()),
            Err(SubmitError::Invalid(errors)) => Err(ApiError::invalid(errors.to_string()).extend()),
            Err(SubmitError::Storage(err)) => Err(storage_error(err)),
        }
    }

    /// `false` when no employee has this id.
    async fn update_employee_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        status: StatusValue,
    ) -> async_graphql::Result<bool> {
        let hr = ctx.data::<HrModule>()?;
        let id = parse_id(&id)?;
        hr.employees()
            .update_status(id, status.into())
            .await
            .map_err(storage_error)
    }

    /// `false` when no employee has this id.
    async fn remove_employee(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let hr = ctx.data::<HrModule>()?;
        let id = parse_id(&id)?;
        hr.employees().remove(id).await.map_err(storage_error)
    }
}

fn parse_id(id: &ID) -> async_graphql::Result<u64> {
    id.parse::<u64>()
        .map_err(|_| ApiError::invalid(format!("malformed employee id {:?}", id.as_str())).extend())
}

fn storage_error(err: HrError) -> async_graphql::Error {
    internal_error(err)
}
