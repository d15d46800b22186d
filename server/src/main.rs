mod config;
mod graphql;
mod http;
mod seed;
mod views;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_db::{
    DatabaseSettings, DbPool, DbStore, FileStore, KeyValueStore, MemoryStore, StoreBackend,
    connect,
};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use products_hr::{EmployeeForm, EmployeeStatus, HrModule, SubmitError};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "employee-suite", version, about = "Employee management server")]
struct Cli {
    /// Overrides STORE_BACKEND (memory, file or database).
    #[arg(long, global = true, value_name = "BACKEND")]
    store: Option<String>,
    /// Tracing filter directives; overrides RUST_LOG.
    #[arg(long, global = true, value_name = "FILTER")]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Insert demo employees into an empty store.
    Seed,
    /// Inspect or edit the employee list.
    #[command(subcommand)]
    Employees(EmployeesCommand),
    /// Print dashboard stats.
    Stats {
        #[arg(long, value_name = "YYYY-MM-DD", help = "Reference date (default: today)")]
        on: Option<NaiveDate>,
    },
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[derive(Subcommand, Debug)]
enum EmployeesCommand {
    /// Print every stored employee.
    List {
        #[arg(long, help = "Emit JSON instead of a table")]
        json: bool,
    },
    /// Validate and store a new employee.
    Add(AddEmployeeArgs),
    /// Change one employee's status.
    SetStatus {
        id: u64,
        #[arg(value_parser = parse_status)]
        status: EmployeeStatus,
    },
    /// Delete one employee.
    Remove { id: u64 },
    /// Delete every employee.
    Reset {
        #[arg(long, help = "Required to confirm the deletion")]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct AddEmployeeArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    department: String,
    #[arg(long)]
    position: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, value_name = "YYYY-MM-DD", default_value = "")]
    hire_date: String,
    #[arg(long, default_value = "")]
    salary: String,
    #[arg(long, default_value = "Active")]
    status: String,
}

impl From<AddEmployeeArgs> for EmployeeForm {
    fn from(value: AddEmployeeArgs) -> Self {
        Self {
            name: value.name,
            email: value.email,
            phone: value.phone,
            department: value.department,
            position: value.position,
            hire_date: value.hire_date,
            salary: value.salary,
            status: value.status,
        }
    }
}

fn parse_status(raw: &str) -> Result<EmployeeStatus, String> {
    raw.parse::<EmployeeStatus>().map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(ObsConfig::from_env().with_filter(cli.log_filter.clone()))?;
    let mut app_config = AppConfig::load()?;
    if let Some(name) = cli.store.as_deref() {
        app_config.store = config::parse_backend(name, &|key| std::env::var(key).ok())?;
    }
    let app_config = Arc::new(app_config);

    let outcome = match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up(&app_config).await,
            MigrateCommand::Down => migrate_down(&app_config).await,
        },
        Command::Seed => run_seed(&app_config).await,
        Command::Employees(cmd) => run_employees(cmd, &app_config).await,
        Command::Stats { on } => print_stats(on, &app_config).await,
        Command::SchemaPrint { output } => schema_print(output),
    };
    shutdown_tracing();
    outcome
}

async fn open_store(config: &AppConfig, allow_dirty: bool) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match &config.store {
        StoreBackend::Memory => {
            warn!("memory store selected; employees are lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File(dir) => {
            info!(dir = %dir.display(), "using file store");
            Arc::new(FileStore::new(dir.clone()))
        }
        StoreBackend::Database(settings) => {
            let pool = setup_pool(settings).await?;
            ensure_migrations(&pool, config.auto_migrate, allow_dirty).await?;
            Arc::new(DbStore::new(pool))
        }
    };
    Ok(store)
}

async fn open_hr(config: &AppConfig) -> Result<HrModule> {
    Ok(HrModule::new(open_store(config, false).await?))
}

async fn setup_pool(settings: &DatabaseSettings) -> Result<DbPool> {
    connect(settings)
        .await
        .with_context(|| format!("failed to connect to {}", settings.url()))
}

async fn ensure_migrations(pool: &DbPool, auto_migrate: bool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if pending.is_empty() {
        return Ok(());
    }
    if auto_migrate {
        Migrator::up(pool, None).await?;
        info!(applied = pending.len(), "database migrations applied");
        return Ok(());
    }
    if !allow_dirty {
        bail!(
            "pending migrations detected; run `employee-suite migrate up`, set AUTO_MIGRATE=1 or pass --allow-dirty"
        );
    }
    warn!(pending = pending.len(), "starting with pending migrations");
    Ok(())
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let store = open_store(&config, cmd.allow_dirty).await?;
    let hr = HrModule::new(store);
    let schema = graphql::build_schema(hr.clone());
    let state = AppState {
        hr,
        schema,
        config: config.clone(),
    };
    info!(store = config.store.kind(), "starting server");
    http::serve((&cmd).into(), state).await
}

fn database_settings(config: &AppConfig) -> Result<&DatabaseSettings> {
    match &config.store {
        StoreBackend::Database(settings) => Ok(settings),
        other => Err(anyhow!(
            "migrations only apply to the database store (current store: {})",
            other.kind()
        )),
    }
}

async fn migrate_up(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(database_settings(config)?).await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(config: &AppConfig) -> Result<()> {
    let pool = setup_pool(database_settings(config)?).await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

async fn run_seed(config: &AppConfig) -> Result<()> {
    let hr = open_hr(config).await?;
    let added = seed::seed_demo(&hr).await?;
    println!("seeded {added} employees");
    Ok(())
}

async fn run_employees(cmd: EmployeesCommand, config: &AppConfig) -> Result<()> {
    let hr = open_hr(config).await?;
    let repo = hr.employees();
    match cmd {
        EmployeesCommand::List { json } => {
            let employees = repo.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&employees)?);
                return Ok(());
            }
            if employees.is_empty() {
                println!("no employees");
            }
            for employee in &employees {
                println!(
                    "{:>14}  {:<24} {:<14} {:<24} {} {}",
                    employee.id,
                    employee.name,
                    employee.department,
                    employee.position,
                    employee.hire_date,
                    employee.status,
                );
            }
        }
        EmployeesCommand::Add(args) => match hr.submit(&args.into()).await {
            Ok(employee) => println!("added employee {} ({})", employee.id, employee.name),
            Err(SubmitError::Invalid(errors)) => bail!("invalid employee: {errors}"),
            Err(SubmitError::Storage(err)) => return Err(err.into()),
        },
        EmployeesCommand::SetStatus { id, status } => {
            if repo.update_status(id, status).await? {
                println!("employee {id} is now {status}");
            } else {
                info!(id, "no employee with this id; nothing changed");
            }
        }
        EmployeesCommand::Remove { id } => {
            if repo.remove(id).await? {
                println!("removed employee {id}");
            } else {
                info!(id, "no employee with this id; nothing removed");
            }
        }
        EmployeesCommand::Reset { yes } => {
            if !yes {
                bail!("refusing to delete every employee without --yes");
            }
            repo.clear().await?;
            println!("employee list cleared");
        }
    }
    Ok(())
}

async fn print_stats(on: Option<NaiveDate>, config: &AppConfig) -> Result<()> {
    let hr = open_hr(config).await?;
    let reference = on.unwrap_or_else(|| Local::now().date_naive());
    let dashboard = hr.dashboard(reference).await?;
    println!("{}", serde_json::to_string_pretty(&dashboard.stats)?);
    Ok(())
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let schema = graphql::build_schema(HrModule::new(Arc::new(MemoryStore::new())));
    let sdl = schema.sdl();
    match path {
        Some(target) => {
            std::fs::write(&target, sdl)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "schema written");
        }
        None => print!("{sdl}"),
    }
    Ok(())
}
