use anyhow::Result;
use chrono::NaiveDate;
use products_hr::{EmployeeDraft, EmployeeStatus, HrModule};
use tracing::info;

struct DemoEmployee {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    department: &'static str,
    position: &'static str,
    hired: (i32, u32, u32),
    salary: &'static str,
    status: EmployeeStatus,
}

const DEMO_EMPLOYEES: [DemoEmployee; 4] = [
    DemoEmployee {
        name: "Ann Lee",
        email: "ann.lee@example.com",
        phone: "555-0101",
        department: "Engineering",
        position: "Software Engineer",
        hired: (2023, 3, 14),
        salary: "95000",
        status: EmployeeStatus::Active,
    },
    DemoEmployee {
        name: "Marcus Webb",
        email: "marcus.webb@example.com",
        phone: "555-0102",
        department: "Sales",
        position: "Account Executive",
        hired: (2022, 11, 1),
        salary: "72000",
        status: EmployeeStatus::Active,
    },
    DemoEmployee {
        name: "Priya Natarajan",
        email: "priya.n@example.com",
        phone: "",
        department: "HR",
        position: "HR Generalist",
        hired: (2024, 6, 3),
        salary: "64000",
        status: EmployeeStatus::Pending,
    },
    DemoEmployee {
        name: "Tom Becker",
        email: "tom.becker@example.com",
        phone: "555-0104",
        department: "Finance",
        position: "Controller",
        hired: (2019, 8, 19),
        salary: "",
        status: EmployeeStatus::Inactive,
    },
];

/// Inserts the demo records when the store holds no employees. Returns how
/// many were added.
pub async fn seed_demo(hr: &HrModule) -> Result<usize> {
    let repo = hr.employees();
    if !repo.list().await?.is_empty() {
        info!("employee list not empty; skipping seed");
        return Ok(0);
    }

    for demo in &DEMO_EMPLOYEES {
        let (year, month, day) = demo.hired;
        let draft = EmployeeDraft {
            name: demo.name.into(),
            email: demo.email.into(),
            phone: demo.phone.into(),
            department: demo.department.into(),
            position: demo.position.into(),
            hire_date: NaiveDate::from_ymd_opt(year, month, day),
            salary: demo.salary.into(),
            status: demo.status,
        };
        repo.add(draft).await?;
    }
    info!(count = DEMO_EMPLOYEES.len(), "seeded demo employees");
    Ok(DEMO_EMPLOYEES.len())
}
