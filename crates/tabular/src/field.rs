//! The ten canonical contact columns and their accepted header spellings.

use database::ContactFields;
use serde::Serialize;

/// One of the fixed contact attributes shared by export and import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    FullName,
    PhoneNumber,
    Address,
    #[serde(rename = "occupation_1")]
    Occupation1,
    #[serde(rename = "occupation_2")]
    Occupation2,
    #[serde(rename = "occupation_3")]
    Occupation3,
    #[serde(rename = "occupation_4")]
    Occupation4,
    ExpectedWage,
    WorkExperience,
    DailyWage,
}

impl CanonicalField {
    /// All fields in export column order.
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::FullName,
        CanonicalField::PhoneNumber,
        CanonicalField::Address,
        CanonicalField::Occupation1,
        CanonicalField::Occupation2,
        CanonicalField::Occupation3,
        CanonicalField::Occupation4,
        CanonicalField::ExpectedWage,
        CanonicalField::WorkExperience,
        CanonicalField::DailyWage,
    ];

    /// Storage column name, also used as the JSON key.
    pub fn column_name(&self) -> &'static str {
        match self {
            CanonicalField::FullName => "full_name",
            CanonicalField::PhoneNumber => "phone_number",
            CanonicalField::Address => "address",
            CanonicalField::Occupation1 => "occupation_1",
            CanonicalField::Occupation2 => "occupation_2",
            CanonicalField::Occupation3 => "occupation_3",
            CanonicalField::Occupation4 => "occupation_4",
            CanonicalField::ExpectedWage => "expected_wage",
            CanonicalField::WorkExperience => "work_experience",
            CanonicalField::DailyWage => "daily_wage",
        }
    }

    /// Column title written in the export header row.
    pub fn header_label(&self) -> &'static str {
        match self {
            CanonicalField::FullName => "Name",
            CanonicalField::PhoneNumber => "Phone",
            CanonicalField::Address => "Address",
            CanonicalField::Occupation1 => "Occupation1",
            CanonicalField::Occupation2 => "Occupation2",
            CanonicalField::Occupation3 => "Occupation3",
            CanonicalField::Occupation4 => "Occupation4",
            CanonicalField::ExpectedWage => "Expected Wage",
            CanonicalField::WorkExperience => "Work Experience",
            CanonicalField::DailyWage => "Daily Wage",
        }
    }

    /// Human-readable name used when telling users which headers are expected.
    pub fn display_name(&self) -> &'static str {
        match self {
            CanonicalField::FullName => "Name",
            CanonicalField::PhoneNumber => "Phone Number",
            CanonicalField::Address => "Address",
            CanonicalField::Occupation1 => "Occupation 1",
            CanonicalField::Occupation2 => "Occupation 2",
            CanonicalField::Occupation3 => "Occupation 3",
            CanonicalField::Occupation4 => "Occupation 4",
            CanonicalField::ExpectedWage => "Expected Wage",
            CanonicalField::WorkExperience => "Work Experience",
            CanonicalField::DailyWage => "Daily Wage",
        }
    }

    /// Normalized header spellings that map to this field.
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::FullName => {
                &["full_name", "fullname", "name", "contact_name", "contactname"]
            }
            CanonicalField::PhoneNumber => &[
                "phone_number",
                "phonenumber",
                "phone",
                "mobile",
                "contact_number",
                "contactnumber",
            ],
            CanonicalField::Address => &["address", "location", "place"],
            CanonicalField::Occupation1 => &[
                "occupation_1",
                "occupation1",
                "primary_occupation",
                "primaryoccupation",
            ],
            CanonicalField::Occupation2 => {
                &["occupation_2", "occupation2", "secondary_occupation"]
            }
            CanonicalField::Occupation3 => {
                &["occupation_3", "occupation3", "tertiary_occupation"]
            }
            CanonicalField::Occupation4 => &["occupation_4", "occupation4", "other_occupation"],
            CanonicalField::ExpectedWage => &[
                "expected_wage",
                "expectedwage",
                "wage_expected",
                "salary_expected",
            ],
            CanonicalField::WorkExperience => &[
                "work_experience",
                "workexperience",
                "experience",
                "years_of_experience",
            ],
            CanonicalField::DailyWage => {
                &["daily_wage", "dailywage", "per_day_wage", "daily_salary"]
            }
        }
    }

    /// Whether a normalized header token names this field.
    pub fn matches(&self, normalized_header: &str) -> bool {
        self.synonyms().contains(&normalized_header)
    }

    /// Read this field from a record.
    pub fn get<'a>(&self, record: &'a ContactFields) -> &'a str {
        match self {
            CanonicalField::FullName => &record.full_name,
            CanonicalField::PhoneNumber => &record.phone_number,
            CanonicalField::Address => &record.address,
            CanonicalField::Occupation1 => &record.occupation_1,
            CanonicalField::Occupation2 => &record.occupation_2,
            CanonicalField::Occupation3 => &record.occupation_3,
            CanonicalField::Occupation4 => &record.occupation_4,
            CanonicalField::ExpectedWage => &record.expected_wage,
            CanonicalField::WorkExperience => &record.work_experience,
            CanonicalField::DailyWage => &record.daily_wage,
        }
    }

    /// Write this field on a record.
    pub fn set(&self, record: &mut ContactFields, value: String) {
        let slot = match self {
            CanonicalField::FullName => &mut record.full_name,
            CanonicalField::PhoneNumber => &mut record.phone_number,
            CanonicalField::Address => &mut record.address,
            CanonicalField::Occupation1 => &mut record.occupation_1,
            CanonicalField::Occupation2 => &mut record.occupation_2,
            CanonicalField::Occupation3 => &mut record.occupation_3,
            CanonicalField::Occupation4 => &mut record.occupation_4,
            CanonicalField::ExpectedWage => &mut record.expected_wage,
            CanonicalField::WorkExperience => &mut record.work_experience,
            CanonicalField::DailyWage => &mut record.daily_wage,
        };
        *slot = value;
    }
}

/// Display names of every field, for "expected headers" guidance.
pub fn expected_headers() -> Vec<&'static str> {
    CanonicalField::ALL.iter().map(|f| f.display_name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_sets_are_disjoint() {
        for (i, a) in CanonicalField::ALL.iter().enumerate() {
            for b in &CanonicalField::ALL[i + 1..] {
                for synonym in a.synonyms() {
                    assert!(!b.matches(synonym), "{synonym} maps to {a:?} and {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_get_and_set_cover_every_field() {
        let mut record = ContactFields::default();
        for (i, field) in CanonicalField::ALL.iter().enumerate() {
            field.set(&mut record, format!("v{i}"));
        }
        for (i, field) in CanonicalField::ALL.iter().enumerate() {
            assert_eq!(field.get(&record), format!("v{i}"));
        }
        assert_eq!(record.daily_wage, "v9");
    }

    #[test]
    fn test_column_name_is_a_synonym() {
        for field in CanonicalField::ALL {
            assert!(field.matches(field.column_name()));
        }
    }
}
