// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};

use relief_intake::{
    create_admin, get_all_households, household_count, insert_households, load_csv,
    served_household_ids, setup_database, DuplicateAuditEngine,
};

fn db_path() -> PathBuf {
    env::var("RELIEF_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("relief.db"))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("import") => {
            let Some(csv_path) = args.get(2) else {
                eprintln!("Usage: relief-intake import <registrations.csv>");
                std::process::exit(1);
            };
            run_import(Path::new(csv_path))?;
        }
        Some("audit") => run_audit()?,
        Some("add-admin") => {
            let (Some(username), Some(password)) = (args.get(2), args.get(3)) else {
                eprintln!("Usage: relief-intake add-admin <username> <password>");
                std::process::exit(1);
            };
            run_add_admin(username, password)?;
        }
        _ => run_dashboard()?,
    }

    Ok(())
}

fn open_database() -> Result<Connection> {
    let path = db_path();
    let conn = Connection::open(&path)?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_import(csv_path: &Path) -> Result<()> {
    println!("🗄️  Registration Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let records = load_csv(csv_path)?;
    println!("✓ Loaded {} registrations from CSV", records.len());

    println!("\n🔧 Setting up database...");
    let conn = open_database()?;
    println!("✓ Database initialized with WAL mode");

    println!("\n💾 Inserting registrations...");
    insert_households(&conn, &records)?;

    println!("\n🔍 Verifying database...");
    let count = household_count(&conn)?;
    println!("✓ Database contains {} households", count);

    Ok(())
}

fn run_audit() -> Result<()> {
    println!("🔍 Duplicate Audit - people appearing in multiple registrations");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_database()?;
    let households = get_all_households(&conn)?;
    println!("\n✓ Loaded {} registrations", households.len());

    let engine = DuplicateAuditEngine::new();
    let groups = engine.detect_duplicates(&households);

    if groups.is_empty() {
        println!("\n✅ No suspected duplicates found. All registrations look unique.");
        return Ok(());
    }

    println!("\n⚠️  {} suspected duplicate group(s):\n", groups.len());

    for group in &groups {
        let birth = group.birth_date.as_deref().unwrap_or("not recorded");
        println!("── {} (born: {})", group.name, birth);
        if group.is_same_household() {
            println!("   note: all occurrences are inside the same registration");
        }
        for entry in &group.occurrences {
            println!(
                "   • {} — registered by {} (household {})",
                entry.role.label(),
                entry.registered_by,
                entry.household_id
            );
        }
        println!();
    }

    Ok(())
}

fn run_add_admin(username: &str, password: &str) -> Result<()> {
    let conn = open_database()?;
    create_admin(&conn, username, password)?;
    println!("✓ Admin '{}' created", username);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_dashboard() -> Result<()> {
    println!("🖥️  Loading Relief Intake dashboard...\n");

    let path = db_path();
    if !path.exists() {
        eprintln!("❌ Database not found at {:?}", path);
        eprintln!("   Run: relief-intake import <registrations.csv>");
        eprintln!("   to import registrations first.");
        std::process::exit(1);
    }

    let conn = Connection::open(&path)?;
    setup_database(&conn)?;

    println!("📊 Loading registrations...");
    let households = get_all_households(&conn)?;
    let served = served_household_ids(&conn)?;
    println!("✓ Loaded {} households\n", households.len());
    println!("Starting dashboard... (Press 'q' to quit)\n");

    let mut app = ui::App::new(households, served);
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_dashboard() -> Result<()> {
    eprintln!("❌ Dashboard mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin relief-server --features server");
    std::process::exit(1);
}
