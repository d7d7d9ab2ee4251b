use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeCategory {
    Other,
    Increased,
    #[serde(rename = "no change", alias = "no-change")]
    NoChange,
    Modified,
    Reduced,
    Eliminated,
}

impl ChangeCategory {
    /// Categories in palette order; index + 1 is the render rank.
    pub const ALL: [ChangeCategory; 6] = [
        ChangeCategory::Other,
        ChangeCategory::Increased,
        ChangeCategory::NoChange,
        ChangeCategory::Modified,
        ChangeCategory::Reduced,
        ChangeCategory::Eliminated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Increased => "increased",
            Self::NoChange => "no change",
            Self::Modified => "modified",
            Self::Reduced => "reduced",
            Self::Eliminated => "eliminated",
        }
    }

    /// Identifier-safe form, used for SVG ids.
    pub fn slug(self) -> &'static str {
        match self {
            Self::NoChange => "no-change",
            other => other.as_str(),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Other => 0,
            Self::Increased => 1,
            Self::NoChange => 2,
            Self::Modified => 3,
            Self::Reduced => 4,
            Self::Eliminated => 5,
        }
    }

    /// Normalize a raw annotation cell. Blank cells mean "no change"; anything
    /// unrecognized is reported and treated as `Other`.
    pub fn from_annotation(raw: &str) -> Self {
        match raw.parse() {
            Ok(category) => category,
            Err(_) => {
                tracing::warn!(value = raw.trim(), "unrecognized change category, using other");
                Self::Other
            }
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown change category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for ChangeCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | "no change" | "no-change" | "nochange" | "none" => Ok(Self::NoChange),
            "other" => Ok(Self::Other),
            "increased" | "increase" => Ok(Self::Increased),
            "modified" => Ok(Self::Modified),
            "reduced" | "reduction" => Ok(Self::Reduced),
            "eliminated" => Ok(Self::Eliminated),
            _ => Err(UnknownCategory(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One row of the change-annotation table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceChange {
    #[serde(deserialize_with = "crate::parser::string_or_number")]
    pub line: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Scenario columns, e.g. `change-15` / `change-30`.
    #[serde(flatten)]
    pub scenarios: BTreeMap<String, serde_json::Value>,
}

impl ServiceChange {
    /// The row has the column, whatever its value.
    pub fn has_scenario(&self, scenario: &str) -> bool {
        self.scenarios.contains_key(scenario)
    }

    pub fn scenario_value(&self, scenario: &str) -> Option<&str> {
        self.scenarios.get(scenario).and_then(serde_json::Value::as_str)
    }

    pub fn category(&self, scenario: &str) -> ChangeCategory {
        match self.scenario_value(scenario) {
            Some(raw) => ChangeCategory::from_annotation(raw),
            None => ChangeCategory::NoChange,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteFeature {
    pub route: String,
    /// Line parts in input order. Empty when the route has no geometry.
    pub parts: Vec<Vec<Point>>,
    pub change: Option<ServiceChange>,
    pub category: ChangeCategory,
}

impl RouteFeature {
    pub fn has_geometry(&self) -> bool {
        self.parts.iter().any(|part| !part.is_empty())
    }

    /// All coordinate pairs of every part, in path order.
    pub fn flat_coordinates(&self) -> impl Iterator<Item = Point> + '_ {
        self.parts.iter().flatten().copied()
    }

    pub fn start(&self) -> Option<Point> {
        self.flat_coordinates().next()
    }
}

/// The joined, classified route collection. Built once by
/// [`crate::dataset::build_route_set`] and passed explicitly afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSet {
    pub scenario: String,
    pub routes: Vec<RouteFeature>,
    /// Shape route ids that had no annotation row.
    pub unmatched: Vec<String>,
}

impl RouteSet {
    pub fn get(&self, route: &str) -> Option<&RouteFeature> {
        self.routes.iter().find(|feature| feature.route == route)
    }

    pub fn with_geometry(&self) -> impl Iterator<Item = &RouteFeature> {
        self.routes.iter().filter(|feature| feature.has_geometry())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_category_is_no_change() {
        assert_eq!(ChangeCategory::from_annotation(""), ChangeCategory::NoChange);
        assert_eq!(ChangeCategory::from_annotation("   "), ChangeCategory::NoChange);
        assert_eq!(ChangeCategory::NoChange.to_string(), "no change");
    }

    #[test]
    fn parses_categories_case_insensitively() {
        assert_eq!("Eliminated ".parse(), Ok(ChangeCategory::Eliminated));
        assert_eq!("REDUCED".parse(), Ok(ChangeCategory::Reduced));
        let err = "sometimes".parse::<ChangeCategory>().unwrap_err();
        assert_eq!(err.to_string(), "unknown change category 'sometimes'");
        assert_eq!(ChangeCategory::from_annotation("sometimes"), ChangeCategory::Other);
    }

    #[test]
    fn missing_scenario_column_is_no_change() {
        let mut change = ServiceChange {
            line: "72".to_string(),
            ..ServiceChange::default()
        };
        change
            .scenarios
            .insert("change-30".to_string(), serde_json::json!("reduced"));
        assert_eq!(change.category("change-30"), ChangeCategory::Reduced);
        assert_eq!(change.category("change-15"), ChangeCategory::NoChange);
    }

    #[test]
    fn flattens_parts_in_order() {
        let feature = RouteFeature {
            route: "6".to_string(),
            parts: vec![
                vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
                vec![Point::new(2.0, 2.0)],
            ],
            change: None,
            category: ChangeCategory::Other,
        };
        let flat: Vec<Point> = feature.flat_coordinates().collect();
        assert_eq!(flat.len(), 3);
        assert_eq!(feature.start(), Some(Point::new(0.0, 0.0)));
        assert_eq!(flat[2], Point::new(2.0, 2.0));
    }
}
