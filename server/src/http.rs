use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Local;
use products_hr::{EmployeeForm, EmployeeStatus, HrError, HrModule, SubmitError};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    config::AppConfig,
    graphql::SchemaType,
    views::{self, Route, Shell, employees::FormState},
};

#[derive(Clone)]
pub struct AppState {
    pub hr: HrModule,
    pub schema: SchemaType,
    pub config: Arc<AppConfig>,
}

impl AppState {
    fn shell(&self, jar: &CookieJar, active: Option<Route>) -> Shell<'_> {
        let collapsed = views::sidebar_collapsed(jar, self.config.sidebar_collapsed_default);
        Shell::new(&self.config.app_title, active, collapsed)
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "employee suite listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::GET])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/", get(dashboard_page))
        .route("/employees", get(employees_page).post(create_employee))
        .route("/employees/{id}/status", post(update_status))
        .route("/employees/{id}/delete", post(delete_employee))
        .route("/sidebar/toggle", post(toggle_sidebar))
        .route("/health", get(health_handler))
        .route("/graphql", post(graphql_handler))
        .route("/graphiql", get(graphiql))
        .fallback(not_found_page)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn dashboard_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> HttpResult<Html<String>> {
    let dashboard = state
        .hr
        .dashboard(Local::now().date_naive())
        .await
        .map_err(HttpError::storage)?;
    let body = views::dashboard::render(&dashboard);
    Ok(Html(
        state.shell(&jar, Some(Route::Dashboard)).render("Dashboard", &body),
    ))
}

#[derive(Deserialize)]
struct EmployeesQuery {
    add: Option<String>,
}

async fn employees_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<EmployeesQuery>,
) -> HttpResult<Html<String>> {
    let employees = state.hr.employees().list().await.map_err(HttpError::storage)?;
    let blank = EmployeeForm::default();
    let form = query.add.is_some().then(|| FormState {
        values: &blank,
        errors: None,
    });
    let body = views::employees::render(&employees, form);
    Ok(Html(
        state.shell(&jar, Some(Route::Employees)).render("Employees", &body),
    ))
}

async fn create_employee(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<EmployeeForm>,
) -> HttpResult<Response> {
    match state.hr.submit(&form).await {
        Ok(_) => Ok(Redirect::to(Route::Employees.path()).into_response()),
        Err(SubmitError::Invalid(errors)) => {
            let employees = state.hr.employees().list().await.map_err(HttpError::storage)?;
            let body = views::employees::render(
                &employees,
                Some(FormState {
                    values: &form,
                    errors: Some(&errors),
                }),
            );
            let page = state.shell(&jar, Some(Route::Employees)).render("Employees", &body);
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(SubmitError::Storage(err)) => Err(HttpError::storage(err)),
    }
}

#[derive(Deserialize)]
struct StatusForm {
    status: String,
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<StatusForm>,
) -> HttpResult<Redirect> {
    let status = form
        .status
        .parse::<EmployeeStatus>()
        .map_err(|_| HttpError::new(StatusCode::BAD_REQUEST, "unknown status"))?;
    state
        .hr
        .employees()
        .update_status(id, status)
        .await
        .map_err(HttpError::storage)?;
    Ok(Redirect::to(Route::Employees.path()))
}

async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> HttpResult<Redirect> {
    state
        .hr
        .employees()
        .remove(id)
        .await
        .map_err(HttpError::storage)?;
    Ok(Redirect::to(Route::Employees.path()))
}

#[derive(Deserialize)]
struct ToggleForm {
    return_to: Option<String>,
}

async fn toggle_sidebar(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ToggleForm>,
) -> (CookieJar, Redirect) {
    let collapsed = views::sidebar_collapsed(&jar, state.config.sidebar_collapsed_default);
    let target = form
        .return_to
        .as_deref()
        .and_then(Route::from_path)
        .unwrap_or(Route::Dashboard);
    let jar = jar.add(views::sidebar_cookie(!collapsed));
    (jar, Redirect::to(target.path()))
}

async fn not_found_page(State(state): State<AppState>, jar: CookieJar, uri: Uri) -> Response {
    let body = views::not_found_body(uri.path());
    let page = state.shell(&jar, None).render("Not found", &body);
    (StatusCode::NOT_FOUND, Html(page)).into_response()
}

async fn graphql_handler(State(state): State<AppState>, request: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(request.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.hr.employees().list().await.is_ok();
    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            ok: store_ok,
            store: state.config.store.kind(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    store: &'static str,
    version: &'static str,
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
        }
    }

    fn storage(err: HrError) -> Self {
        error!(error = %err, "employee storage failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use platform_db::MemoryStore;
    use tower::ServiceExt;

    fn state() -> AppState {
        let hr = HrModule::new(Arc::new(MemoryStore::new()));
        AppState {
            schema: crate::graphql::build_schema(hr.clone()),
            hr,
            config: Arc::new(AppConfig::default()),
        }
    }

    async fn send(state: &AppState, request: http::Request<Body>) -> (StatusCode, http::HeaderMap, String) {
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> http::Request<Body> {
        http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> http::Request<Body> {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn dashboard_on_empty_store_shows_zeroes() {
        let state = state();
        let (status, _, body) = send(&state, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h3>Total Employees</h3><p class=\"stat-number\">0</p>"));
        assert!(body.contains("<a href=\"/\" class=\"nav-link active\">"));
    }

    #[tokio::test]
    async fn create_status_and_delete_through_forms() {
        let state = state();
        let (status, headers, _) = send(
            &state,
            post_form(
                "/employees",
                "name=Ann+Lee&email=ann%40x.com&department=Engineering&position=Engineer&status=Active",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[http::header::LOCATION], "/employees");

        let employees = state.hr.employees().list().await.unwrap();
        assert_eq!(employees.len(), 1);
        let id = employees[0].id;

        let (_, _, page) = send(&state, get("/employees")).await;
        assert!(page.contains("<td>Ann Lee</td>"));

        let (status, _, _) = send(
            &state,
            post_form(&format!("/employees/{id}/status"), "status=Inactive"),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let stored = state.hr.employees().get(id).await.unwrap().unwrap();
        assert_eq!(stored.status, EmployeeStatus::Inactive);

        let (status, _, _) = send(&state, post_form(&format!("/employees/{id}/delete"), "")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(state.hr.employees().list().await.unwrap().is_empty());

        let (status, _, _) = send(&state, post_form(&format!("/employees/{id}/delete"), "")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn missing_required_fields_rerender_form() {
        let state = state();
        let (status, _, body) = send(
            &state,
            post_form("/employees", "name=Ann&department=Sales"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("Add New Employee"));
        assert!(body.contains("Email is required"));
        assert!(body.contains("value=\"Ann\""));
        assert!(state.hr.employees().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let state = state();
        let (status, _, _) = send(&state, post_form("/employees/1/status", "status=Retired")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_query_opens_form() {
        let state = state();
        let (_, _, closed) = send(&state, get("/employees")).await;
        assert!(!closed.contains("Add New Employee"));
        let (_, _, open) = send(&state, get("/employees?add=1")).await;
        assert!(open.contains("Add New Employee"));
        assert!(open.contains("No employees found."));
    }

    #[tokio::test]
    async fn sidebar_toggle_sets_cookie_and_returns() {
        let state = state();
        let (status, headers, _) =
            send(&state, post_form("/sidebar/toggle", "return_to=%2Femployees")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[http::header::LOCATION], "/employees");
        let cookie = headers[http::header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("sidebar=collapsed"));

        let request = http::Request::builder()
            .uri("/employees")
            .header(http::header::COOKIE, "sidebar=collapsed")
            .body(Body::empty())
            .unwrap();
        let (_, _, body) = send(&state, request).await;
        assert!(body.contains("class=\"sidebar collapsed\""));

        let (_, headers, _) =
            send(&state, post_form("/sidebar/toggle", "return_to=https%3A%2F%2Fevil.test")).await;
        assert_eq!(headers[http::header::LOCATION], "/");
    }

    #[tokio::test]
    async fn unknown_paths_render_not_found() {
        let state = state();
        let (status, _, body) = send(&state, get("/reports")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<code>/reports</code>"));
    }

    #[tokio::test]
    async fn health_reports_store_kind() {
        let state = state();
        let (status, _, body) = send(&state, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["store"], "memory");
    }
}
