use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::super::domain::{PatientRecord, Priority, Sex, UnknownVariant};

/// Either every value (`all`) or exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection<T> {
    #[default]
    Any,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Only(selected) => selected == value,
        }
    }
}

impl<T: FromStr<Err = UnknownVariant>> FromStr for Selection<T> {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "all" | "any" => Ok(Self::Any),
            _ => raw.parse::<T>().map(Self::Only),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("all"),
            Self::Only(value) => value.fmt(f),
        }
    }
}

impl<'de, T: FromStr<Err = UnknownVariant>> Deserialize<'de> for Selection<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.as_deref()
            .unwrap_or("all")
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

impl<T: fmt::Display> Serialize for Selection<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Conjunction of the list-screen predicates: free-text search, priority, and sex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    pub search: String,
    pub priority: Selection<Priority>,
    pub sex: Selection<Sex>,
}

impl RecordFilter {
    pub fn is_neutral(&self) -> bool {
        self.search.trim().is_empty()
            && self.priority == Selection::Any
            && self.sex == Selection::Any
    }

    /// Builds a matcher that lowercases the search text once.
    pub fn matcher(&self) -> impl Fn(&PatientRecord) -> bool + '_ {
        let needle = self.search.to_lowercase();
        move |record| {
            record.matches_text(&needle)
                && self.priority.admits(&record.priority)
                && self.sex.admits(&record.sex)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parses_all_and_specific_values() {
        assert_eq!("all".parse::<Selection<Priority>>(), Ok(Selection::Any));
        assert_eq!("".parse::<Selection<Sex>>(), Ok(Selection::Any));
        assert_eq!(
            "urgent".parse::<Selection<Priority>>(),
            Ok(Selection::Only(Priority::Urgent))
        );
        assert!("severe".parse::<Selection<Priority>>().is_err());
        assert_eq!(Selection::Only(Sex::Female).to_string(), "female");
    }

    #[test]
    fn filter_deserializes_from_partial_json() {
        let filter: RecordFilter =
            serde_json::from_str(r#"{"priority":"critical"}"#).expect("filter parses");
        assert_eq!(filter.search, "");
        assert_eq!(filter.priority, Selection::Only(Priority::Critical));
        assert_eq!(filter.sex, Selection::Any);
        assert!(!filter.is_neutral());
        assert!(RecordFilter::default().is_neutral());
    }

    #[test]
    fn filter_serializes_selections_as_tags() {
        let filter = RecordFilter {
            search: "chest".to_string(),
            priority: Selection::Any,
            sex: Selection::Only(Sex::Male),
        };

        let json = serde_json::to_value(&filter).expect("filter serializes");
        assert_eq!(
            json,
            serde_json::json!({ "search": "chest", "priority": "all", "sex": "male" })
        );
        let parsed: RecordFilter = serde_json::from_value(json).expect("filter parses");
        assert_eq!(parsed, filter);
    }
}
