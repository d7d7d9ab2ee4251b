use crate::ir::{ChangeCategory, RouteSet};
use crate::layout::ranking::compare_route_ids_asc;
use crate::theme::CategoryPalette;
use serde::Serialize;

/// Tooltip payload for one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDetails {
    pub route: String,
    pub color: String,
    pub rank: u32,
    pub status: ChangeCategory,
    pub area: Option<String>,
    pub group: Option<String>,
    pub description: Option<String>,
    pub has_geometry: bool,
}

impl RouteDetails {
    pub fn lookup(routes: &RouteSet, id: &str, palette: &CategoryPalette) -> Option<Self> {
        let feature = routes.get(id.trim())?;
        let change = feature.change.as_ref();
        Some(Self {
            route: feature.route.clone(),
            color: palette.color(feature.category).to_string(),
            rank: palette.rank(feature.category),
            status: feature.category,
            area: change.and_then(|c| c.area.clone()),
            group: change.and_then(|c| c.group.clone()),
            description: change.and_then(|c| c.description.clone()),
            has_geometry: feature.has_geometry(),
        })
    }
}

/// Autosuggest candidates for a search box: prefix matches, then other
/// substring matches, each in natural route order. Case-insensitive.
pub fn suggest<'a>(routes: &'a RouteSet, query: &str, limit: usize) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut prefix = Vec::new();
    let mut contains = Vec::new();
    for feature in &routes.routes {
        let id = feature.route.to_lowercase();
        if id.starts_with(&needle) {
            prefix.push(feature.route.as_str());
        } else if id.contains(&needle) {
            contains.push(feature.route.as_str());
        }
    }
    prefix.sort_by(|a, b| compare_route_ids_asc(a, b));
    contains.sort_by(|a, b| compare_route_ids_asc(a, b));
    prefix.into_iter().chain(contains).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Point, RouteFeature, ServiceChange};

    fn set() -> RouteSet {
        let ids = ["72", "72M", "7", "NL", "BRT/1", "Flex Castro Valley", "17"];
        RouteSet {
            scenario: "change-30".to_string(),
            routes: ids
                .iter()
                .map(|id| RouteFeature {
                    route: id.to_string(),
                    parts: if id.starts_with("Flex") {
                        Vec::new()
                    } else {
                        vec![vec![Point::new(0.0, 0.0)]]
                    },
                    change: Some(ServiceChange {
                        line: id.to_string(),
                        area: Some("Oakland".to_string()),
                        description: Some(format!("Route {id}")),
                        ..ServiceChange::default()
                    }),
                    category: ChangeCategory::Reduced,
                })
                .collect(),
            unmatched: Vec::new(),
        }
    }

    #[test]
    fn prefix_matches_come_first() {
        let routes = set();
        assert_eq!(suggest(&routes, "7", 10), vec!["7", "72", "72M", "17"]);
        assert_eq!(suggest(&routes, "7", 2), vec!["7", "72"]);
        assert_eq!(suggest(&routes, "flex", 10), vec!["Flex Castro Valley"]);
        assert_eq!(suggest(&routes, "brt", 10), vec!["BRT/1"]);
        assert!(suggest(&routes, "  ", 10).is_empty());
    }

    #[test]
    fn details_include_annotation_text() {
        let routes = set();
        let details = RouteDetails::lookup(&routes, "NL", &CategoryPalette::default()).unwrap();
        assert_eq!(details.status, ChangeCategory::Reduced);
        assert_eq!(details.color, "#ff9671");
        assert_eq!(details.area.as_deref(), Some("Oakland"));
        assert_eq!(details.description.as_deref(), Some("Route NL"));
        assert!(details.has_geometry);
        let flex = RouteDetails::lookup(&routes, "Flex Castro Valley", &CategoryPalette::default()).unwrap();
        assert!(!flex.has_geometry);
        assert!(RouteDetails::lookup(&routes, "999", &CategoryPalette::default()).is_none());
    }
}
