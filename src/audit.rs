// Duplicate Audit Engine - flag people registered in more than one household
//
// Supports manual fraud review: the same person listed as responsible in one
// registration and as a family member in another (or responsible in both) is
// grouped for a reviewer to inspect.

use crate::db::HouseholdRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// PERSON ENTRY
// ============================================================================

/// How a person appears in a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonRole {
    /// The responsible contact of the registration
    HeadOfHousehold,

    /// Listed in the registration's family-member section
    FamilyMember,
}

impl PersonRole {
    pub fn label(&self) -> &'static str {
        match self {
            PersonRole::HeadOfHousehold => "Head of household",
            PersonRole::FamilyMember => "Family member",
        }
    }
}

/// A flattened projection of one person (head or member) used only for the
/// duplicate audit. Carries a back-reference to the owning registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonEntry {
    pub name: String,

    /// Literal birth date string as stored; None when not recorded.
    pub birth_date: Option<String>,

    pub role: PersonRole,

    /// UUID of the owning household registration
    pub household_id: String,

    /// Responsible person of that registration, for display
    pub registered_by: String,
}

// ============================================================================
// DUPLICATE GROUP
// ============================================================================

/// Two or more person entries sharing a normalized name + birth date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Grouping key: trimmed lowercase name + "|" + birth date (or "null")
    pub key: String,

    /// Display name from the first occurrence
    pub name: String,

    /// Birth date from the first occurrence
    pub birth_date: Option<String>,

    /// All occurrences, in the order they were flattened
    pub occurrences: Vec<PersonEntry>,
}

impl DuplicateGroup {
    /// Number of distinct registrations the occurrences come from. A group
    /// entirely inside one registration cannot indicate cross-registration
    /// fraud, but it still surfaces (a member accidentally repeating the
    /// head's name is worth a look too).
    pub fn distinct_households(&self) -> usize {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.occurrences {
            if !seen.contains(&entry.household_id.as_str()) {
                seen.push(&entry.household_id);
            }
        }
        seen.len()
    }

    /// True when every occurrence comes from the same registration.
    pub fn is_same_household(&self) -> bool {
        self.distinct_households() == 1
    }
}

// ============================================================================
// DUPLICATE AUDIT ENGINE
// ============================================================================

pub struct DuplicateAuditEngine {
    /// Minimum occurrences for a group to be reported (default: 2)
    pub min_group_size: usize,
}

impl DuplicateAuditEngine {
    pub fn new() -> Self {
        DuplicateAuditEngine { min_group_size: 2 }
    }

    /// Find all suspected duplicate people across the full registration
    /// snapshot. Pure: same input order, same output, including group order
    /// and occurrence order.
    pub fn detect_duplicates(&self, records: &[HouseholdRecord]) -> Vec<DuplicateGroup> {
        let entries = self.flatten(records);

        // Group by key, keeping first-insertion order of keys.
        let mut key_order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<PersonEntry>> = HashMap::new();

        for entry in entries {
            let key = grouping_key(&entry.name, entry.birth_date.as_deref());
            if !groups.contains_key(&key) {
                key_order.push(key.clone());
            }
            groups.entry(key).or_default().push(entry);
        }

        let mut result = Vec::new();
        for key in key_order {
            let occurrences = groups.remove(&key).unwrap_or_default();
            if occurrences.len() < self.min_group_size {
                continue;
            }

            result.push(DuplicateGroup {
                key,
                name: occurrences[0].name.clone(),
                birth_date: occurrences[0].birth_date.clone(),
                occurrences,
            });
        }

        result
    }

    /// Flatten registrations to person entries: the responsible person first,
    /// then family members in stored order. Entries with an empty name are
    /// skipped silently - a half-filled member row is not an error.
    fn flatten(&self, records: &[HouseholdRecord]) -> Vec<PersonEntry> {
        let mut entries = Vec::new();

        for record in records {
            if !record.head_name.trim().is_empty() {
                entries.push(PersonEntry {
                    name: record.head_name.clone(),
                    birth_date: record.head_birth_date.clone(),
                    role: PersonRole::HeadOfHousehold,
                    household_id: record.id.clone(),
                    registered_by: record.head_name.clone(),
                });
            }

            for member in &record.members {
                if member.name.trim().is_empty() {
                    continue;
                }
                entries.push(PersonEntry {
                    name: member.name.clone(),
                    birth_date: member.birth_date.clone(),
                    role: PersonRole::FamilyMember,
                    household_id: record.id.clone(),
                    registered_by: record.head_name.clone(),
                });
            }
        }

        entries
    }
}

impl Default for DuplicateAuditEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized grouping key. A missing birth date keys as "null", so an entry
/// without a date never groups with one that has a date - fewer false
/// positives from incomplete forms, at the cost of missing some true matches.
fn grouping_key(name: &str, birth_date: Option<&str>) -> String {
    format!(
        "{}|{}",
        name.trim().to_lowercase(),
        birth_date.unwrap_or("null")
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FamilyMember;

    fn household(
        id: &str,
        head_name: &str,
        head_birth_date: Option<&str>,
        members: Vec<(&str, Option<&str>)>,
    ) -> HouseholdRecord {
        HouseholdRecord {
            id: id.to_string(),
            national_id: format!("nid-{}", id),
            head_name: head_name.to_string(),
            head_birth_date: head_birth_date.map(|s| s.to_string()),
            phone_primary: "555-0100".to_string(),
            phone_secondary: None,
            address: "12 Riverside Rd".to_string(),
            adults: 1,
            children: 0,
            has_disabled_member: false,
            has_pregnant_member: false,
            members: members
                .into_iter()
                .map(|(name, birth)| FamilyMember {
                    name: name.to_string(),
                    birth_date: birth.map(|s| s.to_string()),
                })
                .collect(),
            housing_tenure: "Own".to_string(),
            housing_damage: "Habitable with damage".to_string(),
            employment_status: "Employed".to_string(),
            workplace_affected: false,
            owns_vehicle: false,
            vehicle_affected: false,
            needs: vec![],
            urgent_needs: None,
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn test_same_head_in_two_registrations() {
        let engine = DuplicateAuditEngine::new();

        // Case and surrounding-whitespace differences still group
        let records = vec![
            household("A", "Maria Silva", Some("1980-01-01"), vec![]),
            household("B", " maria silva ", Some("1980-01-01"), vec![]),
        ];

        let groups = engine.detect_duplicates(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "maria silva|1980-01-01");
        assert_eq!(groups[0].occurrences.len(), 2);
        assert!(groups[0]
            .occurrences
            .iter()
            .all(|e| e.role == PersonRole::HeadOfHousehold));
        assert_eq!(groups[0].occurrences[0].household_id, "A");
        assert_eq!(groups[0].occurrences[1].household_id, "B");
        assert_eq!(groups[0].distinct_households(), 2);
    }

    #[test]
    fn test_null_vs_set_birth_date_never_groups() {
        let engine = DuplicateAuditEngine::new();

        let records = vec![
            household("A", "João", Some("1990-05-05"), vec![]),
            household("B", "João", None, vec![]),
        ];

        let groups = engine.detect_duplicates(&records);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_same_household_duplicate_still_surfaces() {
        let engine = DuplicateAuditEngine::new();

        // Member repeats the head's name inside one registration
        let records = vec![household("A", "Ana", None, vec![("Ana", None)])];

        let groups = engine.detect_duplicates(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "ana|null");
        assert_eq!(groups[0].occurrences.len(), 2);
        assert!(groups[0].is_same_household());
        assert_eq!(groups[0].occurrences[0].role, PersonRole::HeadOfHousehold);
        assert_eq!(groups[0].occurrences[1].role, PersonRole::FamilyMember);
    }

    #[test]
    fn test_no_duplicates_is_empty_not_error() {
        let engine = DuplicateAuditEngine::new();

        let records = vec![household(
            "A",
            "Maria Silva",
            Some("1980-01-01"),
            vec![("Pedro", Some("2015-03-10"))],
        )];

        let groups = engine.detect_duplicates(&records);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let engine = DuplicateAuditEngine::new();

        // Half-filled member rows: empty and whitespace-only names
        let records = vec![
            household("A", "Maria", None, vec![("", None), ("  ", Some("2010-01-01"))]),
            household("B", "", None, vec![("Maria", None)]),
        ];

        let groups = engine.detect_duplicates(&records);

        // Only head "Maria" (A) and member "Maria" (B) remain, and they group
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].occurrences.len(), 2);
        assert_eq!(groups[0].key, "maria|null");
    }

    #[test]
    fn test_cross_role_grouping() {
        let engine = DuplicateAuditEngine::new();

        // Same person: head of A, listed member of B
        let records = vec![
            household("A", "Carlos Souza", Some("1975-07-07"), vec![]),
            household(
                "B",
                "Fernanda Souza",
                Some("1978-02-02"),
                vec![("Carlos Souza", Some("1975-07-07"))],
            ),
        ];

        let groups = engine.detect_duplicates(&records);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.occurrences[0].role, PersonRole::HeadOfHousehold);
        assert_eq!(group.occurrences[1].role, PersonRole::FamilyMember);
        assert_eq!(group.occurrences[1].registered_by, "Fernanda Souza");
    }

    #[test]
    fn test_deterministic_output() {
        let engine = DuplicateAuditEngine::new();

        let records = vec![
            household("A", "Maria", None, vec![("Zoe", None), ("Bia", None)]),
            household("B", "Zoe", None, vec![("Maria", None)]),
            household("C", "Bia", None, vec![]),
        ];

        let first = engine.detect_duplicates(&records);
        let second = engine.detect_duplicates(&records);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.occurrences, b.occurrences);
        }

        // Group order follows first occurrence during flattening:
        // maria (head of A), zoe (member of A), bia (member of A)
        let keys: Vec<&str> = first.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["maria|null", "zoe|null", "bia|null"]);
    }

    #[test]
    fn test_no_singleton_groups() {
        let engine = DuplicateAuditEngine::new();

        let records = vec![
            household("A", "Maria", None, vec![("Pedro", None)]),
            household("B", "Maria", None, vec![("Paula", None)]),
        ];

        let groups = engine.detect_duplicates(&records);

        assert!(groups.iter().all(|g| g.occurrences.len() >= 2));
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_member_reordering_only_affects_occurrence_order() {
        let engine = DuplicateAuditEngine::new();

        let forward = vec![
            household("A", "Head A", None, vec![("Rui", None), ("Lia", None)]),
            household("B", "Head B", None, vec![("Lia", None), ("Rui", None)]),
        ];
        let reversed = vec![
            household("A", "Head A", None, vec![("Lia", None), ("Rui", None)]),
            household("B", "Head B", None, vec![("Lia", None), ("Rui", None)]),
        ];

        let g1 = engine.detect_duplicates(&forward);
        let g2 = engine.detect_duplicates(&reversed);

        // Same group membership either way
        let mut keys1: Vec<&str> = g1.iter().map(|g| g.key.as_str()).collect();
        let mut keys2: Vec<&str> = g2.iter().map(|g| g.key.as_str()).collect();
        keys1.sort_unstable();
        keys2.sort_unstable();
        assert_eq!(keys1, keys2);

        for key in keys1 {
            let a = g1.iter().find(|g| g.key == key).unwrap();
            let b = g2.iter().find(|g| g.key == key).unwrap();
            assert_eq!(a.occurrences.len(), b.occurrences.len());
        }
    }

    #[test]
    fn test_literal_date_strings_not_canonicalized() {
        let engine = DuplicateAuditEngine::new();

        // Same calendar day, different stored representation: no group
        let records = vec![
            household("A", "Maria", Some("1980-01-01"), vec![]),
            household("B", "Maria", Some("01/01/1980"), vec![]),
        ];

        let groups = engine.detect_duplicates(&records);
        assert!(groups.is_empty());
    }
}
