// Relief Intake - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod audit;
pub mod auth;
pub mod db;
pub mod filters;

// Re-export commonly used types
pub use audit::{DuplicateAuditEngine, DuplicateGroup, PersonEntry, PersonRole};
pub use auth::{
    create_admin, issue_session, revoke_session, validate_session, verify_credentials, Session,
    DEFAULT_SESSION_TTL_HOURS,
};
pub use db::{
    get_all_households, get_household, get_served_events, household_count, insert_household,
    insert_households, load_csv, mark_served, served_household_ids, setup_database, FamilyMember,
    HouseholdRecord, InsertOutcome, ServedEvent,
};
pub use filters::DashboardFilters;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
