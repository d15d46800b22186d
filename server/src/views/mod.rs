//! Server-rendered pages: the navigation shell plus the dashboard and
//! employees views.

pub mod dashboard;
pub mod employees;

use std::fmt::Write as _;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::NaiveDate;
use products_hr::EmployeeStatus;
use time::Duration as TimeDuration;

pub const SIDEBAR_COOKIE: &str = "sidebar";

/// The two pages reachable from the sidebar.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Employees,
}

impl Route {
    pub const MENU: [Route; 2] = [Route::Dashboard, Route::Employees];

    /// Exact match only; no nested routes or redirects.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::MENU.into_iter().find(|route| route.path() == path)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Employees => "/employees",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Employees => "Employees",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Route::Dashboard => "📊",
            Route::Employees => "👥",
        }
    }
}

/// Per-request chrome around a page body. `active` is `None` on the 404 page.
#[derive(Clone, Debug)]
pub struct Shell<'a> {
    pub app_title: &'a str,
    pub active: Option<Route>,
    pub collapsed: bool,
}

impl<'a> Shell<'a> {
    pub fn new(app_title: &'a str, active: Option<Route>, collapsed: bool) -> Self {
        Self {
            app_title,
            active,
            collapsed,
        }
    }

    pub fn render(&self, page_title: &str, body: &str) -> String {
        let mut html = String::with_capacity(body.len() + 2048);
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{page} · {app}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
             <div class=\"App\">\n",
            page = escape(page_title),
            app = escape(self.app_title),
        );
        self.render_sidebar(&mut html);
        let _ = write!(html, "<main class=\"main-content\">\n{body}</main>\n</div>\n</body>\n</html>\n");
        html
    }

    fn render_sidebar(&self, html: &mut String) {
        let class = if self.collapsed { "sidebar collapsed" } else { "sidebar" };
        let title = if self.collapsed { String::new() } else { escape(self.app_title) };
        let arrow = if self.collapsed { "→" } else { "←" };
        let return_to = self.active.unwrap_or(Route::Dashboard).path();
        let _ = write!(
            html,
            "<div class=\"{class}\">\n<div class=\"sidebar-header\">\n\
             <h3 class=\"sidebar-title\">{title}</h3>\n\
             <form method=\"post\" action=\"/sidebar/toggle\">\
             <input type=\"hidden\" name=\"return_to\" value=\"{return_to}\">\
             <button class=\"toggle-btn\" type=\"submit\">{arrow}</button></form>\n\
             </div>\n<nav class=\"sidebar-nav\">\n<ul class=\"nav-list\">\n"
        );
        for route in Route::MENU {
            let active = if self.active == Some(route) { " active" } else { "" };
            let label = if self.collapsed {
                String::new()
            } else {
                format!("<span class=\"nav-text\">{}</span>", route.title())
            };
            let _ = writeln!(
                html,
                "<li class=\"nav-item\"><a href=\"{path}\" class=\"nav-link{active}\">\
                 <span class=\"nav-icon\">{icon}</span>{label}</a></li>",
                path = route.path(),
                icon = route.icon(),
            );
        }
        html.push_str("</ul>\n</nav>\n</div>\n");
    }
}

/// Collapsed state from the cookie, falling back to the configured default.
pub fn sidebar_collapsed(jar: &CookieJar, default: bool) -> bool {
    match jar.get(SIDEBAR_COOKIE).map(|cookie| cookie.value()) {
        Some("collapsed") => true,
        Some("expanded") => false,
        _ => default,
    }
}

pub fn sidebar_cookie(collapsed: bool) -> Cookie<'static> {
    let value = if collapsed { "collapsed" } else { "expanded" };
    Cookie::build((SIDEBAR_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::days(365))
        .build()
}

pub fn not_found_body(path: &str) -> String {
    format!(
        "<div class=\"not-found\">\n<h1>Page not found</h1>\n\
         <p>Nothing lives at <code>{}</code>.</p>\n<p><a href=\"/\">Back to the dashboard</a></p>\n</div>\n",
        escape(path)
    )
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_hire_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// `$85,000` for numeric input (fractions truncated), `-` when blank, and
/// the escaped raw text otherwise.
pub fn format_salary(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "-".to_string();
    }
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return escape(trimmed);
    }
    let digits = digits.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}${grouped}")
}

pub fn status_badge(status: EmployeeStatus) -> String {
    format!(
        "<span class=\"status {}\">{}</span>",
        status.as_str().to_lowercase(),
        status.as_str()
    )
}

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;background:#f5f6fa;color:#2d3436}\
.App{display:flex;min-height:100vh}\
.sidebar{width:240px;background:#2c3e50;color:#fff;padding:1rem}\
.sidebar.collapsed{width:64px}\
.sidebar-header{display:flex;justify-content:space-between;align-items:center}\
.toggle-btn{background:none;border:none;color:#fff;cursor:pointer;font-size:1.2rem}\
.nav-list{list-style:none;padding:0}\
.nav-link{display:flex;gap:.5rem;padding:.6rem;color:#ecf0f1;text-decoration:none;border-radius:6px}\
.nav-link.active{background:#34495e}\
.main-content{flex:1;padding:2rem}\
.stats-grid{display:grid;grid-template-columns:repeat(auto-fit,minmax(200px,1fr));gap:1rem}\
.stat-card{display:flex;gap:1rem;background:#fff;padding:1rem;border-radius:8px}\
.stat-number{font-size:2rem;font-weight:bold;margin:.2rem 0}\
table{width:100%;border-collapse:collapse;background:#fff}\
th,td{padding:.6rem;text-align:left;border-bottom:1px solid #eee}\
.status.active{color:#27ae60}.status.inactive{color:#c0392b}.status.pending{color:#f39c12}\
.form-row{display:flex;gap:1rem}.form-group{flex:1;display:flex;flex-direction:column;margin-bottom:.8rem}\
.field-error{color:#c0392b;font-size:.85rem}\
.no-employees{padding:2rem;text-align:center;color:#636e72}";
