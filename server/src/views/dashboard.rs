use std::fmt::Write as _;

use products_hr::Dashboard;

use super::{escape, format_hire_date, status_badge};

pub fn render(dashboard: &Dashboard) -> String {
    let stats = &dashboard.stats;
    let cards = [
        ("👥", "Total Employees", stats.total_employees, "All employees in the system"),
        ("✅", "Active Employees", stats.active_employees, "Currently active employees"),
        ("🏢", "Departments", stats.departments, "Different departments"),
        ("🆕", "New This Month", stats.new_this_month, "Employees hired this month"),
    ];

    let mut html = String::from(
        "<div class=\"dashboard\">\n<div class=\"dashboard-header\">\n<h1>Dashboard</h1>\n\
         <p>Employee Management System Overview</p>\n</div>\n<div class=\"stats-grid\">\n",
    );
    for (icon, label, value, description) in cards {
        let _ = writeln!(
            html,
            "<div class=\"stat-card\"><div class=\"stat-icon\">{icon}</div>\
             <div class=\"stat-content\"><h3>{label}</h3>\
             <p class=\"stat-number\">{value}</p>\
             <p class=\"stat-description\">{description}</p></div></div>"
        );
    }
    html.push_str(
        "</div>\n<div class=\"recent-employees\">\n<h2>Recent Employees</h2>\n\
         <div class=\"employees-table\">\n<table>\n<thead><tr><th>Name</th><th>Department</th>\
         <th>Position</th><th>Hire Date</th><th>Status</th></tr></thead>\n<tbody>\n",
    );
    for employee in &dashboard.recent {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&employee.name),
            escape(&employee.department),
            escape(&employee.position),
            format_hire_date(employee.hire_date),
            status_badge(employee.status),
        );
    }
    html.push_str("</tbody>\n</table>\n</div>\n</div>\n</div>\n");
    html
}
