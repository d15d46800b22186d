use std::fmt::Write as _;

use products_hr::{Department, Employee, EmployeeForm, EmployeeStatus, FormError, FormField};

use super::{escape, format_hire_date, format_salary};

/// The add form as it should be shown: fresh, or re-displayed after a
/// rejected submission.
pub struct FormState<'a> {
    pub values: &'a EmployeeForm,
    pub errors: Option<&'a FormError>,
}

pub fn render(employees: &[Employee], form: Option<FormState<'_>>) -> String {
    let mut html = String::from(
        "<div class=\"employees\">\n<div class=\"employees-header\">\n<div>\n<h1>Employees</h1>\n\
         <p>Manage all employees in the system</p>\n</div>\n\
         <a class=\"add-employee-btn\" href=\"/employees?add=1\">+ Add Employee</a>\n</div>\n",
    );
    if let Some(form) = form {
        render_form(&mut html, &form);
    }

    html.push_str(
        "<div class=\"employees-table\">\n<table>\n<thead><tr><th>Name</th><th>Email</th>\
         <th>Department</th><th>Position</th><th>Hire Date</th><th>Salary</th><th>Status</th>\
         <th>Actions</th></tr></thead>\n<tbody>\n",
    );
    for employee in employees {
        render_row(&mut html, employee);
    }
    html.push_str("</tbody>\n</table>\n");
    if employees.is_empty() {
        html.push_str(
            "<div class=\"no-employees\">\n\
             <p>No employees found. Add your first employee to get started!</p>\n</div>\n",
        );
    }
    html.push_str("</div>\n</div>\n");
    html
}

fn render_row(html: &mut String, employee: &Employee) {
    let id = employee.id;
    let _ = write!(
        html,
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
        escape(&employee.name),
        escape(&employee.email),
        escape(&employee.department),
        escape(&employee.position),
        format_hire_date(employee.hire_date),
        format_salary(&employee.salary),
    );
    let _ = write!(
        html,
        "<td><form method=\"post\" action=\"/employees/{id}/status\">\
         <select name=\"status\" class=\"status-select {}\" onchange=\"this.form.submit()\">{}</select>\
         <noscript><button type=\"submit\">Update</button></noscript></form></td>",
        employee.status.as_str().to_lowercase(),
        status_options(employee.status.as_str()),
    );
    let _ = writeln!(
        html,
        "<td><form method=\"post\" action=\"/employees/{id}/delete\">\
         <button class=\"delete-btn\" type=\"submit\" title=\"Delete Employee\">🗑️</button>\
         </form></td></tr>"
    );
}

fn render_form(html: &mut String, form: &FormState<'_>) {
    let values = form.values;
    html.push_str(
        "<div class=\"add-employee-form\">\n<h2>Add New Employee</h2>\n\
         <form method=\"post\" action=\"/employees\">\n",
    );
    if form.errors.is_some() {
        html.push_str("<p class=\"field-error\">Please correct the highlighted fields.</p>\n");
    }

    html.push_str("<div class=\"form-row\">\n");
    text_input(html, form, FormField::Name, "Name *", "text", &values.name, true);
    text_input(html, form, FormField::Email, "Email *", "email", &values.email, true);
    html.push_str("</div>\n<div class=\"form-row\">\n");
    text_input(html, form, FormField::Phone, "Phone", "tel", &values.phone, false);
    let mut departments = String::from("<option value=\"\">Select Department</option>");
    for department in Department::ALL {
        push_option(&mut departments, department.as_str(), &values.department);
    }
    select_input(html, form, FormField::Department, "Department *", &departments, true);
    html.push_str("</div>\n<div class=\"form-row\">\n");
    text_input(html, form, FormField::Position, "Position *", "text", &values.position, true);
    text_input(html, form, FormField::HireDate, "Hire Date", "date", &values.hire_date, false);
    html.push_str("</div>\n<div class=\"form-row\">\n");
    text_input(html, form, FormField::Salary, "Salary", "number", &values.salary, false);
    select_input(
        html,
        form,
        FormField::Status,
        "Status",
        &status_options(&values.status),
        false,
    );
    html.push_str(
        "</div>\n<div class=\"form-actions\">\n\
         <button type=\"submit\" class=\"submit-btn\">Add Employee</button>\n\
         <a class=\"cancel-btn\" href=\"/employees\">Cancel</a>\n</div>\n</form>\n</div>\n",
    );
}

fn text_input(
    html: &mut String,
    form: &FormState<'_>,
    field: FormField,
    label: &str,
    kind: &str,
    value: &str,
    required: bool,
) {
    let required = if required { " required" } else { "" };
    let placeholder = if field == FormField::Salary {
        " placeholder=\"Annual salary\""
    } else {
        ""
    };
    let _ = writeln!(
        html,
        "<div class=\"form-group\"><label>{label}</label>\
         <input type=\"{kind}\" name=\"{name}\" value=\"{value}\"{placeholder}{required}>{error}</div>",
        name = field.as_str(),
        value = escape(value),
        error = field_error(form, field),
    );
}

fn select_input(
    html: &mut String,
    form: &FormState<'_>,
    field: FormField,
    label: &str,
    options: &str,
    required: bool,
) {
    let required = if required { " required" } else { "" };
    let _ = writeln!(
        html,
        "<div class=\"form-group\"><label>{label}</label>\
         <select name=\"{name}\"{required}>{options}</select>{error}</div>",
        name = field.as_str(),
        error = field_error(form, field),
    );
}

fn field_error(form: &FormState<'_>, field: FormField) -> String {
    form.errors
        .and_then(|errors| errors.message_for(field))
        .map(|message| format!("<span class=\"field-error\">{message}</span>"))
        .unwrap_or_default()
}

fn status_options(selected: &str) -> String {
    let mut options = String::new();
    for status in EmployeeStatus::ALL {
        push_option(&mut options, status.as_str(), selected);
    }
    options
}

fn push_option(out: &mut String, value: &str, selected: &str) {
    let marker = if value == selected { " selected" } else { "" };
    let _ = write!(out, "<option value=\"{value}\"{marker}>{value}</option>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use products_hr::EmployeeDraft;

    fn employee(id: u64, salary: &str) -> Employee {
        EmployeeDraft {
            name: "Ann Lee".into(),
            email: "ann@x.com".into(),
            department: "Engineering".into(),
            position: "Engineer".into(),
            salary: salary.into(),
            status: EmployeeStatus::Inactive,
            ..Default::default()
        }
        .into_employee(id, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    #[test]
    fn empty_list_shows_hint_and_no_form() {
        let html = render(&[], None);
        assert!(html.contains("No employees found. Add your first employee to get started!"));
        assert!(!html.contains("Add New Employee"));
    }

    #[test]
    fn rows_carry_status_selector_and_delete_action() {
        let html = render(&[employee(42, "85000")], None);
        assert!(html.contains("<td>$85,000</td>"));
        assert!(html.contains("action=\"/employees/42/status\""));
        assert!(html.contains("<option value=\"Inactive\" selected>Inactive</option>"));
        assert!(html.contains("action=\"/employees/42/delete\""));
        assert!(!html.contains("No employees found"));
    }

    #[test]
    fn blank_salary_renders_dash() {
        let html = render(&[employee(1, "")], None);
        assert!(html.contains("<td>-</td>"));
    }

    #[test]
    fn rejected_form_keeps_values_and_shows_messages() {
        let values = EmployeeForm {
            name: "Ann \"A\" Lee".into(),
            department: "Sales".into(),
            ..Default::default()
        };
        let errors = values.validate().unwrap_err();
        let html = render(
            &[],
            Some(FormState {
                values: &values,
                errors: Some(&errors),
            }),
        );
        assert!(html.contains("value=\"Ann &quot;A&quot; Lee\""));
        assert!(html.contains("<option value=\"Sales\" selected>Sales</option>"));
        assert!(html.contains("<span class=\"field-error\">Email is required</span>"));
        assert!(html.contains("<span class=\"field-error\">Position is required</span>"));
        assert!(html.contains("<option value=\"Active\" selected>Active</option>"));
    }
}
