//! The add-employee form: raw submitted strings and their validation.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Department, EmployeeDraft, EmployeeStatus};

/// Field values exactly as submitted, camelCase like the HTML inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeeForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    pub hire_date: String,
    pub salary: String,
    pub status: String,
}

impl Default for EmployeeForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            department: String::new(),
            position: String::new(),
            hire_date: String::new(),
            salary: String::new(),
            status: EmployeeStatus::Active.as_str().to_string(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Email,
    Phone,
    Department,
    Position,
    HireDate,
    Salary,
    Status,
}

impl FormField {
    /// The input's `name` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::Department => "department",
            FormField::Position => "position",
            FormField::HireDate => "hireDate",
            FormField::Salary => "salary",
            FormField::Status => "status",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: FormField,
    pub message: &'static str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("{}", summary(.issues))]
pub struct FormError {
    issues: Vec<FieldIssue>,
}

fn summary(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormError {
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn message_for(&self, field: FormField) -> Option<&'static str> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message)
    }

    fn push(&mut self, field: FormField, message: &'static str) {
        self.issues.push(FieldIssue { field, message });
    }
}

impl EmployeeForm {
    /// Checks the required fields (name, email, department, position) and the
    /// shape of typed inputs. Salary and phone are free text.
    pub fn validate(&self) -> Result<EmployeeDraft, FormError> {
        let mut errors = FormError::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FormField::Name, "Name is required");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FormField::Email, "Email is required");
        } else if !looks_like_email(email) {
            errors.push(FormField::Email, "Enter a valid email address");
        }

        let department = self.department.trim();
        if department.is_empty() {
            errors.push(FormField::Department, "Select a department");
        } else if department.parse::<Department>().is_err() {
            errors.push(FormField::Department, "Unknown department");
        }

        let position = self.position.trim();
        if position.is_empty() {
            errors.push(FormField::Position, "Position is required");
        }

        let hire_date = match self.hire_date.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(FormField::HireDate, "Hire date must be YYYY-MM-DD");
                    None
                }
            },
        };

        let status = match self.status.trim() {
            "" => EmployeeStatus::default(),
            raw => raw.parse::<EmployeeStatus>().unwrap_or_else(|_| {
                errors.push(FormField::Status, "Unknown status");
                EmployeeStatus::default()
            }),
        };

        if !errors.issues.is_empty() {
            return Err(errors);
        }

        Ok(EmployeeDraft {
            name: name.to_string(),
            email: email.to_string(),
            phone: self.phone.trim().to_string(),
            department: department.to_string(),
            position: position.to_string(),
            hire_date,
            salary: self.salary.trim().to_string(),
            status,
        })
    }
}

/// Roughly what a browser `type="email"` input accepts: `local@domain`.
fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
