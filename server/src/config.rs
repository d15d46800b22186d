use std::path::PathBuf;

use anyhow::{Result, anyhow};
use platform_db::{DatabaseSettings, StoreBackend};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_APP_TITLE: &str = "Employee Management";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub auto_migrate: bool,
    pub app_title: String,
    pub sidebar_collapsed_default: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            auto_migrate: false,
            app_title: DEFAULT_APP_TITLE.into(),
            sidebar_collapsed_default: false,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "file".into());
        let store = parse_backend(&backend, &lookup)?;

        let auto_migrate = env_bool(lookup("AUTO_MIGRATE"), false);
        let sidebar_collapsed_default = env_bool(lookup("SIDEBAR_COLLAPSED_DEFAULT"), false);
        let app_title = lookup("APP_TITLE")
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_TITLE.into());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            store,
            auto_migrate,
            app_title,
            sidebar_collapsed_default,
            cors_allowed_origins,
        })
    }
}

pub fn parse_backend(
    name: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<StoreBackend> {
    match name.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(StoreBackend::Memory),
        "file" => {
            let dir = lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into());
            Ok(StoreBackend::File(PathBuf::from(dir)))
        }
        "database" | "db" => Ok(StoreBackend::Database(DatabaseSettings::from_lookup(lookup))),
        other => Err(anyhow!(
            "unknown STORE_BACKEND {other:?} (expected memory, file or database)"
        )),
    }
}

fn env_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}
