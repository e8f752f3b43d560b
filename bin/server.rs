// Relief Intake - REST API server
//
// Public surface: registration intake and login. Everything else requires a
// bearer token issued by /api/login and checked server-side on every request.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use relief_intake::{
    auth, db, DashboardFilters, DuplicateAuditEngine, DuplicateGroup, FamilyMember,
    HouseholdRecord, InsertOutcome, ServedEvent,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

/// Public intake form payload.
#[derive(Deserialize)]
struct RegistrationRequest {
    national_id: String,
    head_name: String,
    #[serde(default)]
    head_birth_date: Option<String>,
    phone_primary: String,
    #[serde(default)]
    phone_secondary: Option<String>,
    address: String,
    adults: i64,
    children: i64,
    #[serde(default)]
    has_disabled_member: bool,
    #[serde(default)]
    has_pregnant_member: bool,
    #[serde(default)]
    members: Vec<FamilyMember>,
    housing_tenure: String,
    housing_damage: String,
    employment_status: String,
    #[serde(default)]
    workplace_affected: bool,
    #[serde(default)]
    owns_vehicle: bool,
    #[serde(default)]
    vehicle_affected: bool,
    #[serde(default)]
    needs: Vec<String>,
    #[serde(default)]
    urgent_needs: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl RegistrationRequest {
    fn into_record(self) -> HouseholdRecord {
        // Half-filled member rows from the form are dropped here; the audit
        // engine skips empty names anyway, but there is no reason to store them.
        let members = self
            .members
            .into_iter()
            .filter(|m| !m.name.trim().is_empty())
            .collect();

        HouseholdRecord {
            id: uuid::Uuid::new_v4().to_string(),
            national_id: self.national_id,
            head_name: self.head_name,
            head_birth_date: self.head_birth_date.filter(|s| !s.trim().is_empty()),
            phone_primary: self.phone_primary,
            phone_secondary: self.phone_secondary.filter(|s| !s.trim().is_empty()),
            address: self.address,
            adults: self.adults,
            children: self.children,
            has_disabled_member: self.has_disabled_member,
            has_pregnant_member: self.has_pregnant_member,
            members,
            housing_tenure: self.housing_tenure,
            housing_damage: self.housing_damage,
            employment_status: self.employment_status,
            workplace_affected: self.workplace_affected,
            owns_vehicle: self.owns_vehicle,
            vehicle_affected: self.vehicle_affected,
            needs: self.needs,
            urgent_needs: self.urgent_needs.filter(|s| !s.trim().is_empty()),
            notes: self.notes.filter(|s| !s.trim().is_empty()),
            created_at: None,
        }
    }
}

#[derive(Serialize, Default)]
struct RegistrationResponse {
    id: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Default)]
struct LoginResponse {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Default)]
struct HouseholdQuery {
    name_contains: Option<String>,
    address_contains: Option<String>,
    housing_damage: Option<String>,
    employment_status: Option<String>,
    min_household_size: Option<i64>,
    /// Comma-separated list; every need must be present
    needs: Option<String>,
}

impl HouseholdQuery {
    fn into_filters(self) -> DashboardFilters {
        let needs = self
            .needs
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        DashboardFilters {
            name_contains: self.name_contains,
            address_contains: self.address_contains,
            housing_damage: self.housing_damage,
            employment_status: self.employment_status,
            min_household_size: self.min_household_size,
            needs,
        }
    }
}

#[derive(Deserialize)]
struct MarkServedRequest {
    #[serde(default)]
    note: Option<String>,
}

// ============================================================================
// Auth guard
// ============================================================================

/// Check the bearer token on a gated route. The token in the sessions table
/// is the authorization gate; nothing client-side is trusted.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<auth::Session, StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let conn = state.db.lock().unwrap();
    match auth::validate_session(&conn, token) {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            eprintln!("Error validating session: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/registrations - Public intake form submission
async fn create_registration(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> impl IntoResponse {
    let record = request.into_record();
    let conn = state.db.lock().unwrap();

    match db::insert_household(&conn, &record) {
        Ok(InsertOutcome::Inserted) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(RegistrationResponse { id: record.id })),
        )
            .into_response(),
        Ok(InsertOutcome::DuplicateNationalId) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::err(
                RegistrationResponse::default(),
                "This national ID is already registered. Visit a support point to update the existing registration.",
            )),
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error inserting registration: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(
                    RegistrationResponse::default(),
                    "Could not save the registration.",
                )),
            )
                .into_response()
        }
    }
}

/// POST /api/login - Credential check, issues a session token
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match auth::verify_credentials(&conn, &request.username, &request.password) {
        Ok(true) => {
            match auth::issue_session(&conn, &request.username, auth::DEFAULT_SESSION_TTL_HOURS) {
                Ok(session) => (
                    StatusCode::OK,
                    Json(ApiResponse::ok(LoginResponse {
                        token: session.token,
                        expires_at: Some(session.expires_at),
                    })),
                )
                    .into_response(),
                Err(e) => {
                    eprintln!("Error issuing session: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::err(LoginResponse::default(), "Login failed.")),
                    )
                        .into_response()
                }
            }
        }
        Ok(false) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::err(
                LoginResponse::default(),
                "Invalid username or password.",
            )),
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error verifying credentials: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(LoginResponse::default(), "Login failed.")),
            )
                .into_response()
        }
    }
}

/// POST /api/logout - Revoke the presented session token
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let session = match authorize(&state, &headers) {
        Ok(s) => s,
        Err(status) => return status.into_response(),
    };

    let conn = state.db.lock().unwrap();
    match auth::revoke_session(&conn, &session.token) {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok("logged out"))).into_response(),
        Err(e) => {
            eprintln!("Error revoking session: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/households - Full snapshot, optionally filtered
async fn get_households(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HouseholdQuery>,
) -> impl IntoResponse {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }

    let conn = state.db.lock().unwrap();

    match db::get_all_households(&conn) {
        Ok(households) => {
            let filters = query.into_filters();
            let visible = if filters.is_active() {
                filters.apply(&households)
            } else {
                households
            };

            (StatusCode::OK, Json(ApiResponse::ok(visible))).into_response()
        }
        Err(e) => {
            eprintln!("Error getting households: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(
                    Vec::<HouseholdRecord>::new(),
                    "Could not load registrations.",
                )),
            )
                .into_response()
        }
    }
}

/// GET /api/households/:id - One household with its served history
async fn get_household_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }

    let conn = state.db.lock().unwrap();

    let household = match db::get_household(&conn, &id) {
        Ok(Some(h)) => h,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            eprintln!("Error getting household {}: {}", id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let served_events = db::get_served_events(&conn, &id).unwrap_or_default();

    #[derive(Serialize)]
    struct HouseholdDetail {
        #[serde(flatten)]
        household: HouseholdRecord,
        served_events: Vec<ServedEvent>,
    }

    (
        StatusCode::OK,
        Json(ApiResponse::ok(HouseholdDetail {
            household,
            served_events,
        })),
    )
        .into_response()
}

/// POST /api/households/:id/served - Append a served event
async fn mark_household_served(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<MarkServedRequest>,
) -> impl IntoResponse {
    let session = match authorize(&state, &headers) {
        Ok(s) => s,
        Err(status) => return status.into_response(),
    };

    let conn = state.db.lock().unwrap();

    // 404 on unknown id, before appending anything
    match db::get_household(&conn, &id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            eprintln!("Error looking up household {}: {}", id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    match db::mark_served(&conn, &id, &session.username, request.note.as_deref()) {
        Ok(event) => (StatusCode::CREATED, Json(ApiResponse::ok(event))).into_response(),
        Err(e) => {
            eprintln!("Error marking household {} served: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/audit/duplicates - Run the duplicate audit over the full snapshot
async fn get_duplicate_audit(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(status) = authorize(&state, &headers) {
        return status.into_response();
    }

    let conn = state.db.lock().unwrap();

    // If the snapshot fetch fails, the engine never runs.
    match db::get_all_households(&conn) {
        Ok(households) => {
            let groups = DuplicateAuditEngine::new().detect_duplicates(&households);
            (StatusCode::OK, Json(ApiResponse::ok(groups))).into_response()
        }
        Err(e) => {
            eprintln!("Error loading households for audit: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(
                    Vec::<DuplicateGroup>::new(),
                    "Could not load the data for the audit.",
                )),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Relief Intake - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::var("RELIEF_DB").unwrap_or_else(|_| "relief.db".to_string());

    let conn = Connection::open(&db_path).expect("Failed to open database");
    db::setup_database(&conn).expect("Failed to initialize database");
    println!("✓ Database opened: {}", db_path);

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/registrations", post(create_registration))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/households", get(get_households))
        .route("/households/:id", get(get_household_detail))
        .route("/households/:id/served", post(mark_household_served))
        .route("/audit/duplicates", get(get_duplicate_audit))
        .with_state(state.clone());

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Intake: POST http://localhost:3000/api/registrations");
    println!("   Admin:  POST http://localhost:3000/api/login");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
