use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::HrError;

/// One stored employee record.
///
/// Serialized with camelCase field names (`hireDate`) so the persisted
/// array matches the layout written by earlier versions of the app.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Kept as free text: records written outside the form may carry blank
    /// or unlisted departments and must still load.
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    pub hire_date: NaiveDate,
    #[serde(default, deserialize_with = "salary_text")]
    pub salary: String,
    #[serde(default)]
    pub status: EmployeeStatus,
}

/// Salary is free text, but hand-edited files often store it as a number.
fn salary_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Salary {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Salary>::deserialize(deserializer)? {
        Some(Salary::Text(text)) => text,
        Some(Salary::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

/// Everything needed to create an [`Employee`] except its id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmployeeDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    /// `None` means "hired today".
    pub hire_date: Option<NaiveDate>,
    pub salary: String,
    pub status: EmployeeStatus,
}

impl EmployeeDraft {
    pub fn into_employee(self, id: u64, today: NaiveDate) -> Employee {
        Employee {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            department: self.department,
            position: self.position,
            hire_date: self.hire_date.unwrap_or(today),
            salary: self.salary,
            status: self.status,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl EmployeeStatus {
    pub const ALL: [EmployeeStatus; 3] = [
        EmployeeStatus::Active,
        EmployeeStatus::Inactive,
        EmployeeStatus::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "Active",
            EmployeeStatus::Inactive => "Inactive",
            EmployeeStatus::Pending => "Pending",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = HrError;

    /// Exact, case-sensitive match on the stored spelling.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| HrError::UnknownStatus(value.to_owned()))
    }
}

/// Departments offered by the create form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Department {
    Engineering,
    Marketing,
    Sales,
    Hr,
    Finance,
    Operations,
}

impl Department {
    pub const ALL: [Department; 6] = [
        Department::Engineering,
        Department::Marketing,
        Department::Sales,
        Department::Hr,
        Department::Finance,
        Department::Operations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Engineering => "Engineering",
            Department::Marketing => "Marketing",
            Department::Sales => "Sales",
            Department::Hr => "HR",
            Department::Finance => "Finance",
            Department::Operations => "Operations",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = HrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|department| department.as_str() == value)
            .ok_or_else(|| HrError::UnknownDepartment(value.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_legacy_record_layout() {
        let raw = json!({
            "name": "Ann Lee",
            "email": "ann@x.com",
            "phone": "",
            "department": "Engineering",
            "position": "Engineer",
            "hireDate": "2026-10-02",
            "salary": "85000",
            "status": "Active",
            "id": 1_760_000_000_000u64
        });
        let employee: Employee = serde_json::from_value(raw).unwrap();
        assert_eq!(employee.id, 1_760_000_000_000);
        assert_eq!(employee.hire_date, NaiveDate::from_ymd_opt(2026, 10, 2).unwrap());
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[test]
    fn numeric_or_null_salary_reads_as_text() {
        let base = json!({
            "id": 3,
            "name": "Bo",
            "email": "bo@x.com",
            "hireDate": "2025-05-01",
        });
        let mut numeric = base.clone();
        numeric["salary"] = json!(90000);
        let employee: Employee = serde_json::from_value(numeric).unwrap();
        assert_eq!(employee.salary, "90000");

        let mut null = base.clone();
        null["salary"] = serde_json::Value::Null;
        let employee: Employee = serde_json::from_value(null).unwrap();
        assert_eq!(employee.salary, "");

        let employee: Employee = serde_json::from_value(base).unwrap();
        assert_eq!(employee.salary, "");
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[test]
    fn serializes_hire_date_as_iso_day() {
        let employee = EmployeeDraft {
            name: "Ann Lee".into(),
            hire_date: Some(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            ..Default::default()
        }
        .into_employee(7, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        let value = serde_json::to_value(&employee).unwrap();
        assert_eq!(value["hireDate"], "2026-01-05");
        assert_eq!(value["status"], "Active");
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn status_parsing_is_case_sensitive() {
        assert_eq!("Pending".parse::<EmployeeStatus>().unwrap(), EmployeeStatus::Pending);
        assert!("active".parse::<EmployeeStatus>().is_err());
    }

    #[test]
    fn department_labels_match_form_options() {
        let labels: Vec<_> = Department::ALL.iter().map(Department::as_str).collect();
        assert_eq!(
            labels,
            ["Engineering", "Marketing", "Sales", "HR", "Finance", "Operations"]
        );
        assert_eq!("HR".parse::<Department>().unwrap(), Department::Hr);
    }
}
