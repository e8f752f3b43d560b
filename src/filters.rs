// Dashboard filter layer - predicates over the in-memory household snapshot
//
// Filters are independent and combine with logical AND. The visible subset is
// recomputed from the full list whenever any filter value changes; nothing is
// pushed down to the store.

use crate::db::HouseholdRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilters {
    /// Case-insensitive substring match on the responsible person's name
    #[serde(default)]
    pub name_contains: Option<String>,

    /// Case-insensitive substring match on the address
    #[serde(default)]
    pub address_contains: Option<String>,

    /// Exact match on the housing damage qualification
    #[serde(default)]
    pub housing_damage: Option<String>,

    /// Exact match on the employment status
    #[serde(default)]
    pub employment_status: Option<String>,

    /// Minimum household size (adults + children)
    #[serde(default)]
    pub min_household_size: Option<i64>,

    /// Needs that must all be present in the record's needs list
    #[serde(default)]
    pub needs: Vec<String>,
}

impl DashboardFilters {
    pub fn is_active(&self) -> bool {
        self.name_contains.is_some()
            || self.address_contains.is_some()
            || self.housing_damage.is_some()
            || self.employment_status.is_some()
            || self.min_household_size.is_some()
            || !self.needs.is_empty()
    }

    pub fn clear(&mut self) {
        *self = DashboardFilters::default();
    }

    /// All active predicates must hold.
    pub fn matches(&self, record: &HouseholdRecord) -> bool {
        if let Some(fragment) = &self.name_contains {
            if !record
                .head_name
                .to_lowercase()
                .contains(&fragment.to_lowercase())
            {
                return false;
            }
        }

        if let Some(fragment) = &self.address_contains {
            if !record
                .address
                .to_lowercase()
                .contains(&fragment.to_lowercase())
            {
                return false;
            }
        }

        if let Some(damage) = &self.housing_damage {
            if &record.housing_damage != damage {
                return false;
            }
        }

        if let Some(status) = &self.employment_status {
            if &record.employment_status != status {
                return false;
            }
        }

        if let Some(min) = self.min_household_size {
            if record.household_size() < min {
                return false;
            }
        }

        for need in &self.needs {
            if !record.needs.contains(need) {
                return false;
            }
        }

        true
    }

    /// Recompute the visible subset from the full snapshot.
    pub fn apply(&self, records: &[HouseholdRecord]) -> Vec<HouseholdRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn household(
        head_name: &str,
        address: &str,
        housing_damage: &str,
        employment_status: &str,
        adults: i64,
        children: i64,
        needs: Vec<&str>,
    ) -> HouseholdRecord {
        HouseholdRecord {
            id: uuid::Uuid::new_v4().to_string(),
            national_id: uuid::Uuid::new_v4().to_string(),
            head_name: head_name.to_string(),
            head_birth_date: None,
            phone_primary: "555-0100".to_string(),
            phone_secondary: None,
            address: address.to_string(),
            adults,
            children,
            has_disabled_member: false,
            has_pregnant_member: false,
            members: vec![],
            housing_tenure: "Own".to_string(),
            housing_damage: housing_damage.to_string(),
            employment_status: employment_status.to_string(),
            workplace_affected: false,
            owns_vehicle: false,
            vehicle_affected: false,
            needs: needs.into_iter().map(|s| s.to_string()).collect(),
            urgent_needs: None,
            notes: None,
            created_at: None,
        }
    }

    fn sample_records() -> Vec<HouseholdRecord> {
        vec![
            household(
                "Maria Silva",
                "12 Riverside Rd",
                "Total loss",
                "Unemployed",
                2,
                3,
                vec!["Food", "Mattresses"],
            ),
            household(
                "João Santos",
                "4 Hilltop Ave",
                "Habitable with damage",
                "Employed",
                1,
                0,
                vec!["Food"],
            ),
            household(
                "Ana Pereira",
                "88 Riverside Rd",
                "Total loss",
                "Employed",
                2,
                0,
                vec!["Drinking water"],
            ),
        ]
    }

    #[test]
    fn test_inactive_filters_pass_everything() {
        let filters = DashboardFilters::default();
        let records = sample_records();

        assert!(!filters.is_active());
        assert_eq!(filters.apply(&records).len(), records.len());
    }

    #[test]
    fn test_name_contains_is_case_insensitive() {
        let filters = DashboardFilters {
            name_contains: Some("maria".to_string()),
            ..Default::default()
        };

        let visible = filters.apply(&sample_records());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].head_name, "Maria Silva");
    }

    #[test]
    fn test_address_contains() {
        let filters = DashboardFilters {
            address_contains: Some("riverside".to_string()),
            ..Default::default()
        };

        let visible = filters.apply(&sample_records());
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filters = DashboardFilters {
            address_contains: Some("riverside".to_string()),
            housing_damage: Some("Total loss".to_string()),
            employment_status: Some("Employed".to_string()),
            ..Default::default()
        };

        let visible = filters.apply(&sample_records());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].head_name, "Ana Pereira");
    }

    #[test]
    fn test_min_household_size_threshold() {
        let filters = DashboardFilters {
            min_household_size: Some(3),
            ..Default::default()
        };

        let visible = filters.apply(&sample_records());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].head_name, "Maria Silva");
    }

    #[test]
    fn test_needs_membership() {
        let filters = DashboardFilters {
            needs: vec!["Food".to_string()],
            ..Default::default()
        };
        assert_eq!(filters.apply(&sample_records()).len(), 2);

        // Multi-select: every selected need must be present
        let filters = DashboardFilters {
            needs: vec!["Food".to_string(), "Mattresses".to_string()],
            ..Default::default()
        };
        let visible = filters.apply(&sample_records());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].head_name, "Maria Silva");
    }

    #[test]
    fn test_clear_resets_all_predicates() {
        let mut filters = DashboardFilters {
            name_contains: Some("maria".to_string()),
            min_household_size: Some(2),
            needs: vec!["Food".to_string()],
            ..Default::default()
        };

        assert!(filters.is_active());
        filters.clear();
        assert!(!filters.is_active());
        assert_eq!(filters, DashboardFilters::default());
    }
}
