use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{Employee, EmployeeStatus};

/// Headline numbers shown on the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_employees: usize,
    pub active_employees: usize,
    /// Distinct department strings; blank counts as its own value.
    pub departments: usize,
    /// Hired in the same calendar month and year as the reference date.
    pub new_this_month: usize,
}

pub fn compute_stats(employees: &[Employee], reference: NaiveDate) -> Stats {
    let departments: HashSet<&str> = employees
        .iter()
        .map(|employee| employee.department.as_str())
        .collect();
    Stats {
        total_employees: employees.len(),
        active_employees: employees
            .iter()
            .filter(|employee| employee.status == EmployeeStatus::Active)
            .count(),
        departments: departments.len(),
        new_this_month: employees
            .iter()
            .filter(|employee| {
                employee.hire_date.year() == reference.year()
                    && employee.hire_date.month() == reference.month()
            })
            .count(),
    }
}
