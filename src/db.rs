use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One person listed inside a household registration who is not the
/// responsible contact. Owned by exactly one `HouseholdRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub name: String,

    /// Birth date as entered on the form (YYYY-MM-DD). Kept as the literal
    /// string; never reformatted.
    #[serde(default)]
    pub birth_date: Option<String>,
}

/// One submitted registration: a household requesting assistance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdRecord {
    /// Stable identity (UUID). Assigned once, never reused.
    #[serde(default = "default_uuid")]
    pub id: String,

    /// External identifier of the responsible person (national ID).
    /// UNIQUE in the store - a second registration with the same one is rejected.
    pub national_id: String,

    pub head_name: String,

    /// Responsible person's birth date, literal form string.
    #[serde(default)]
    pub head_birth_date: Option<String>,

    pub phone_primary: String,
    #[serde(default)]
    pub phone_secondary: Option<String>,

    pub address: String,

    pub adults: i64,
    pub children: i64,
    #[serde(default)]
    pub has_disabled_member: bool,
    #[serde(default)]
    pub has_pregnant_member: bool,

    /// Family members in the order they were entered on the form.
    #[serde(default)]
    pub members: Vec<FamilyMember>,

    /// "Own" / "Rent"
    pub housing_tenure: String,
    /// Post-disaster qualification ("Habitable with damage", "Uninhabitable", ...)
    pub housing_damage: String,

    pub employment_status: String,
    #[serde(default)]
    pub workplace_affected: bool,
    #[serde(default)]
    pub owns_vehicle: bool,
    #[serde(default)]
    pub vehicle_affected: bool,

    /// Multi-select needs list ("Food", "Drinking water", "Mattresses", ...)
    #[serde(default)]
    pub needs: Vec<String>,

    #[serde(default)]
    pub urgent_needs: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl HouseholdRecord {
    /// Declared household size: adults + children.
    pub fn household_size(&self) -> i64 {
        self.adults + self.children
    }
}

/// Append-only record of assistance delivered to a household.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServedEvent {
    pub event_id: String,
    pub household_id: String,
    pub served_at: DateTime<Utc>,
    pub actor: String,
    pub note: Option<String>,
}

/// Outcome of a single registration insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A registration with the same national ID already exists.
    DuplicateNationalId,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS households (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            household_uuid TEXT UNIQUE NOT NULL,
            national_id TEXT UNIQUE NOT NULL,
            head_name TEXT NOT NULL,
            head_birth_date TEXT,
            phone_primary TEXT NOT NULL,
            phone_secondary TEXT,
            address TEXT NOT NULL,
            adults INTEGER NOT NULL DEFAULT 0,
            children INTEGER NOT NULL DEFAULT 0,
            has_disabled_member INTEGER NOT NULL DEFAULT 0,
            has_pregnant_member INTEGER NOT NULL DEFAULT 0,
            members TEXT NOT NULL DEFAULT '[]',
            housing_tenure TEXT NOT NULL,
            housing_damage TEXT NOT NULL,
            employment_status TEXT NOT NULL,
            workplace_affected INTEGER NOT NULL DEFAULT 0,
            owns_vehicle INTEGER NOT NULL DEFAULT 0,
            vehicle_affected INTEGER NOT NULL DEFAULT 0,
            needs TEXT NOT NULL DEFAULT '[]',
            urgent_needs TEXT,
            notes TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS admins (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            token TEXT UNIQUE NOT NULL,
            username TEXT NOT NULL,
            issued_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )",
        [],
    )?;

    // Append-only log: a household can be served more than once.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS served_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            household_uuid TEXT NOT NULL,
            served_at TEXT NOT NULL,
            actor TEXT NOT NULL,
            note TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_households_national_id ON households(national_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_served_household ON served_events(household_uuid)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_token ON sessions(token)",
        [],
    )?;

    Ok(())
}

/// Insert one registration. A duplicate national ID is reported as an
/// outcome, not an error - the intake form tells the family to update their
/// existing registration at a support point instead.
pub fn insert_household(conn: &Connection, record: &HouseholdRecord) -> Result<InsertOutcome> {
    let members_json = serde_json::to_string(&record.members)?;
    let needs_json = serde_json::to_string(&record.needs)?;
    let created_at = record.created_at.unwrap_or_else(Utc::now).to_rfc3339();

    let result = conn.execute(
        "INSERT INTO households (
            household_uuid, national_id, head_name, head_birth_date,
            phone_primary, phone_secondary, address,
            adults, children, has_disabled_member, has_pregnant_member,
            members, housing_tenure, housing_damage, employment_status,
            workplace_affected, owns_vehicle, vehicle_affected,
            needs, urgent_needs, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
        params![
            record.id,
            record.national_id,
            record.head_name,
            record.head_birth_date,
            record.phone_primary,
            record.phone_secondary,
            record.address,
            record.adults,
            record.children,
            record.has_disabled_member,
            record.has_pregnant_member,
            members_json,
            record.housing_tenure,
            record.housing_damage,
            record.employment_status,
            record.workplace_affected,
            record.owns_vehicle,
            record.vehicle_affected,
            needs_json,
            record.urgent_needs,
            record.notes,
            created_at,
        ],
    );

    match result {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(InsertOutcome::DuplicateNationalId)
        }
        Err(e) => Err(e.into()),
    }
}

/// Bulk insert (CSV import path). Returns the number actually inserted.
pub fn insert_households(conn: &Connection, records: &[HouseholdRecord]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for record in records {
        match insert_household(conn, record)? {
            InsertOutcome::Inserted => inserted += 1,
            InsertOutcome::DuplicateNationalId => duplicates += 1,
        }
    }

    println!("✓ Inserted: {} registrations", inserted);
    println!("✓ Skipped duplicates: {}", duplicates);

    Ok(inserted)
}

fn row_to_household(row: &rusqlite::Row<'_>) -> rusqlite::Result<HouseholdRecord> {
    let members_json: String = row.get(11)?;
    let needs_json: String = row.get(18)?;
    let created_at_str: String = row.get(21)?;

    let members: Vec<FamilyMember> = serde_json::from_str(&members_json).unwrap_or_default();
    let needs: Vec<String> = serde_json::from_str(&needs_json).unwrap_or_default();
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc));

    Ok(HouseholdRecord {
        id: row.get(0)?,
        national_id: row.get(1)?,
        head_name: row.get(2)?,
        head_birth_date: row.get(3)?,
        phone_primary: row.get(4)?,
        phone_secondary: row.get(5)?,
        address: row.get(6)?,
        adults: row.get(7)?,
        children: row.get(8)?,
        has_disabled_member: row.get(9)?,
        has_pregnant_member: row.get(10)?,
        members,
        housing_tenure: row.get(12)?,
        housing_damage: row.get(13)?,
        employment_status: row.get(14)?,
        workplace_affected: row.get(15)?,
        owns_vehicle: row.get(16)?,
        vehicle_affected: row.get(17)?,
        needs,
        urgent_needs: row.get(19)?,
        notes: row.get(20)?,
        created_at,
    })
}

const HOUSEHOLD_COLUMNS: &str = "household_uuid, national_id, head_name, head_birth_date,
        phone_primary, phone_secondary, address,
        adults, children, has_disabled_member, has_pregnant_member,
        members, housing_tenure, housing_damage, employment_status,
        workplace_affected, owns_vehicle, vehicle_affected,
        needs, urgent_needs, notes, created_at";

/// Fetch the complete current record set, newest first. This is the snapshot
/// both the dashboard and the duplicate audit operate on - no pagination.
pub fn get_all_households(conn: &Connection) -> Result<Vec<HouseholdRecord>> {
    let sql = format!(
        "SELECT {} FROM households ORDER BY created_at DESC, id DESC",
        HOUSEHOLD_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let households = stmt
        .query_map([], row_to_household)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(households)
}

/// Fetch a single household by its UUID.
pub fn get_household(conn: &Connection, household_id: &str) -> Result<Option<HouseholdRecord>> {
    let sql = format!(
        "SELECT {} FROM households WHERE household_uuid = ?1",
        HOUSEHOLD_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let household = stmt
        .query_row(params![household_id], row_to_household)
        .optional()?;

    Ok(household)
}

/// Append a served event for a household. Fails if the household id is unknown.
pub fn mark_served(
    conn: &Connection,
    household_id: &str,
    actor: &str,
    note: Option<&str>,
) -> Result<ServedEvent> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM households WHERE household_uuid = ?1",
            params![household_id],
            |row| row.get(0),
        )
        .optional()?;

    if exists.is_none() {
        bail!("Unknown household id: {}", household_id);
    }

    let event = ServedEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        household_id: household_id.to_string(),
        served_at: Utc::now(),
        actor: actor.to_string(),
        note: note.map(|s| s.to_string()),
    };

    conn.execute(
        "INSERT INTO served_events (event_id, household_uuid, served_at, actor, note)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            event.event_id,
            event.household_id,
            event.served_at.to_rfc3339(),
            event.actor,
            event.note,
        ],
    )?;

    Ok(event)
}

/// Served events for one household, newest first.
pub fn get_served_events(conn: &Connection, household_id: &str) -> Result<Vec<ServedEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, household_uuid, served_at, actor, note
         FROM served_events
         WHERE household_uuid = ?1
         ORDER BY served_at DESC",
    )?;

    let events = stmt
        .query_map(params![household_id], |row| {
            let served_at_str: String = row.get(2)?;
            Ok(ServedEvent {
                event_id: row.get(0)?,
                household_id: row.get(1)?,
                served_at: DateTime::parse_from_rfc3339(&served_at_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                actor: row.get(3)?,
                note: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Ids of all households that have at least one served event.
pub fn served_household_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT household_uuid FROM served_events")?;

    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids)
}

pub fn household_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM households", [], |row| row.get(0))?;

    Ok(count)
}

/// CSV row for bulk import. Registrations collected on paper are transcribed
/// to a spreadsheet; members and needs columns carry JSON.
#[derive(Debug, Deserialize)]
struct CsvHouseholdRow {
    #[serde(rename = "National_ID")]
    national_id: String,
    #[serde(rename = "Head_Name")]
    head_name: String,
    #[serde(rename = "Head_Birth_Date")]
    head_birth_date: Option<String>,
    #[serde(rename = "Phone_Primary")]
    phone_primary: String,
    #[serde(rename = "Phone_Secondary")]
    phone_secondary: Option<String>,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Adults")]
    adults: i64,
    #[serde(rename = "Children")]
    children: i64,
    #[serde(rename = "Has_Disabled_Member", default)]
    has_disabled_member: bool,
    #[serde(rename = "Has_Pregnant_Member", default)]
    has_pregnant_member: bool,
    #[serde(rename = "Members_JSON", default)]
    members_json: String,
    #[serde(rename = "Housing_Tenure")]
    housing_tenure: String,
    #[serde(rename = "Housing_Damage")]
    housing_damage: String,
    #[serde(rename = "Employment_Status")]
    employment_status: String,
    #[serde(rename = "Workplace_Affected", default)]
    workplace_affected: bool,
    #[serde(rename = "Owns_Vehicle", default)]
    owns_vehicle: bool,
    #[serde(rename = "Vehicle_Affected", default)]
    vehicle_affected: bool,
    #[serde(rename = "Needs_JSON", default)]
    needs_json: String,
    #[serde(rename = "Urgent_Needs")]
    urgent_needs: Option<String>,
    #[serde(rename = "Notes")]
    notes: Option<String>,
}

impl CsvHouseholdRow {
    fn into_record(self) -> HouseholdRecord {
        let members = if self.members_json.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.members_json).unwrap_or_default()
        };
        let needs = if self.needs_json.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.needs_json).unwrap_or_default()
        };

        // Empty date cells come through as Some(""); treat them as absent.
        let head_birth_date = self.head_birth_date.filter(|s| !s.trim().is_empty());

        HouseholdRecord {
            id: uuid::Uuid::new_v4().to_string(),
            national_id: self.national_id,
            head_name: self.head_name,
            head_birth_date,
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
            needs,
            urgent_needs: self.urgent_needs.filter(|s| !s.trim().is_empty()),
            notes: self.notes.filter(|s| !s.trim().is_empty()),
            created_at: None,
        }
    }
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<HouseholdRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut records = Vec::new();

    for result in rdr.deserialize() {
        let row: CsvHouseholdRow = result.context("Failed to deserialize registration row")?;
        records.push(row.into_record());
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_household(national_id: &str, head_name: &str) -> HouseholdRecord {
        HouseholdRecord {
            id: uuid::Uuid::new_v4().to_string(),
            national_id: national_id.to_string(),
            head_name: head_name.to_string(),
            head_birth_date: Some("1980-01-01".to_string()),
            phone_primary: "555-0100".to_string(),
            phone_secondary: None,
            address: "12 Riverside Rd".to_string(),
            adults: 2,
            children: 1,
            has_disabled_member: false,
            has_pregnant_member: false,
            members: vec![FamilyMember {
                name: "Pedro Silva".to_string(),
                birth_date: Some("2015-03-10".to_string()),
            }],
            housing_tenure: "Own".to_string(),
            housing_damage: "Habitable with damage".to_string(),
            employment_status: "Employed".to_string(),
            workplace_affected: false,
            owns_vehicle: true,
            vehicle_affected: true,
            needs: vec!["Food".to_string(), "Drinking water".to_string()],
            urgent_needs: Some("Blood pressure medication".to_string()),
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn test_insert_and_fetch_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let record = create_test_household("111.222.333-44", "Maria Silva");
        let outcome = insert_household(&conn, &record).unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);

        let all = get_all_households(&conn).unwrap();
        assert_eq!(all.len(), 1);

        let fetched = &all[0];
        assert_eq!(fetched.id, record.id);
        assert_eq!(fetched.national_id, "111.222.333-44");
        assert_eq!(fetched.head_name, "Maria Silva");
        assert_eq!(fetched.head_birth_date.as_deref(), Some("1980-01-01"));
        assert_eq!(fetched.members, record.members);
        assert_eq!(fetched.needs, record.needs);
        assert_eq!(fetched.household_size(), 3);
        assert!(fetched.created_at.is_some());
    }

    #[test]
    fn test_duplicate_national_id_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let first = create_test_household("111.222.333-44", "Maria Silva");
        let second = create_test_household("111.222.333-44", "Maria S. Oliveira");

        assert_eq!(
            insert_household(&conn, &first).unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            insert_household(&conn, &second).unwrap(),
            InsertOutcome::DuplicateNationalId
        );
        assert_eq!(household_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_bulk_insert_counts() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let records = vec![
            create_test_household("100", "Ana"),
            create_test_household("200", "Bruno"),
            create_test_household("100", "Ana Again"),
        ];

        let inserted = insert_households(&conn, &records).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(household_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_mark_served_appends() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let record = create_test_household("100", "Ana");
        insert_household(&conn, &record).unwrap();

        mark_served(&conn, &record.id, "volunteer-7", Some("food kit")).unwrap();
        mark_served(&conn, &record.id, "volunteer-3", None).unwrap();

        let events = get_served_events(&conn, &record.id).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.household_id == record.id));

        let served = served_household_ids(&conn).unwrap();
        assert_eq!(served, vec![record.id.clone()]);
    }

    #[test]
    fn test_mark_served_unknown_household_fails() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let result = mark_served(&conn, "no-such-id", "volunteer-7", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_household_by_id() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let record = create_test_household("100", "Ana");
        insert_household(&conn, &record).unwrap();

        let found = get_household(&conn, &record.id).unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().head_name, "Ana");

        let missing = get_household(&conn, "no-such-id").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_load_csv_parses_members_and_needs() {
        let dir = std::env::temp_dir();
        let path = dir.join("relief_intake_test_import.csv");

        let csv = "National_ID,Head_Name,Head_Birth_Date,Phone_Primary,Phone_Secondary,Address,Adults,Children,Has_Disabled_Member,Has_Pregnant_Member,Members_JSON,Housing_Tenure,Housing_Damage,Employment_Status,Workplace_Affected,Owns_Vehicle,Vehicle_Affected,Needs_JSON,Urgent_Needs,Notes\n\
100,Maria Silva,1980-01-01,555-0100,,12 Riverside Rd,2,1,false,false,\"[{\"\"name\"\":\"\"Pedro\"\",\"\"birth_date\"\":\"\"2015-03-10\"\"}]\",Own,Habitable with damage,Employed,false,true,true,\"[\"\"Food\"\"]\",,\n";
        std::fs::write(&path, csv).unwrap();

        let records = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.head_name, "Maria Silva");
        assert_eq!(r.members.len(), 1);
        assert_eq!(r.members[0].name, "Pedro");
        assert_eq!(r.needs, vec!["Food".to_string()]);
        assert!(r.phone_secondary.is_none());
    }
}
