use crate::config::DataConfig;
use crate::ir::{ChangeCategory, RouteFeature, RouteSet, ServiceChange};
use crate::parser::{DataError, RouteShape};
use std::collections::{HashMap, HashSet};

/// Join route shapes with the change table.
///
/// Shape codes and change lines both go through the rename table. Shapes that
/// share a public id are merged into one route. Shapes with no change row are
/// classified `other` (or dropped when `include_unmatched` is off) and reported
/// once. Change rows with no shape are kept as geometry-less routes when their
/// line carries the configured marker.
pub fn build_route_set(
    shapes: Vec<RouteShape>,
    changes: Vec<ServiceChange>,
    config: &DataConfig,
) -> Result<RouteSet, DataError> {
    let changes = normalize_changes(changes, config);
    ensure_scenario(&changes, &config.scenario)?;

    let mut by_line: HashMap<&str, &ServiceChange> = HashMap::with_capacity(changes.len());
    for change in &changes {
        by_line.insert(change.line.as_str(), change);
    }

    let mut merged: Vec<(String, RouteShape)> = Vec::new();
    let mut merged_index: HashMap<String, usize> = HashMap::new();
    for shape in shapes {
        let route = config.public_id(&shape.code);
        match merged_index.get(&route) {
            Some(&idx) => {
                tracing::debug!(route = %route, "merging additional shape into route");
                merged[idx].1.parts.extend(shape.parts);
            }
            None => {
                merged_index.insert(route.clone(), merged.len());
                merged.push((route, shape));
            }
        }
    }

    let mut routes = Vec::with_capacity(merged.len());
    let mut unmatched = Vec::new();
    for (route, shape) in merged {
        let change = by_line.get(route.as_str()).map(|change| (*change).clone());
        let category = match &change {
            Some(change) => change.category(&config.scenario),
            None => {
                unmatched.push(route.clone());
                if !config.include_unmatched {
                    continue;
                }
                ChangeCategory::Other
            }
        };
        routes.push(RouteFeature {
            route,
            parts: shape.parts,
            change,
            category,
        });
    }

    if !unmatched.is_empty() {
        tracing::warn!("no information for: {}", unmatched.join(", "));
    }

    let marker = config
        .geometryless_marker
        .as_deref()
        .map(str::to_lowercase)
        .filter(|marker| !marker.is_empty());
    let shaped: HashSet<&str> = merged_index.keys().map(String::as_str).collect();
    for change in &changes {
        if shaped.contains(change.line.as_str()) {
            continue;
        }
        let is_geometryless = marker
            .as_deref()
            .is_some_and(|marker| change.line.to_lowercase().contains(marker));
        if !is_geometryless {
            tracing::debug!(line = %change.line, "change row has no route shape");
            continue;
        }
        routes.push(RouteFeature {
            route: change.line.clone(),
            parts: Vec::new(),
            category: change.category(&config.scenario),
            change: Some(change.clone()),
        });
    }

    Ok(RouteSet {
        scenario: config.scenario.clone(),
        routes,
        unmatched,
    })
}

impl RouteSet {
    /// Reclassify every route under another scenario column.
    pub fn with_scenario(&self, scenario: &str) -> Result<RouteSet, DataError> {
        let rows: Vec<&ServiceChange> = self.routes.iter().filter_map(|route| route.change.as_ref()).collect();
        if !rows.is_empty() && !rows.iter().any(|change| change.has_scenario(scenario)) {
            return Err(DataError::UnknownScenario(scenario.to_string()));
        }
        let routes = self
            .routes
            .iter()
            .map(|route| RouteFeature {
                category: route
                    .change
                    .as_ref()
                    .map_or(ChangeCategory::Other, |change| change.category(scenario)),
                ..route.clone()
            })
            .collect();
        Ok(RouteSet {
            scenario: scenario.to_string(),
            routes,
            unmatched: self.unmatched.clone(),
        })
    }
}

// The first row for a line wins.
fn normalize_changes(changes: Vec<ServiceChange>, config: &DataConfig) -> Vec<ServiceChange> {
    let mut seen = HashSet::with_capacity(changes.len());
    let mut out = Vec::with_capacity(changes.len());
    for mut change in changes {
        change.line = config.public_id(&change.line);
        if !seen.insert(change.line.clone()) {
            tracing::warn!(line = %change.line, "duplicate change row ignored");
            continue;
        }
        out.push(change);
    }
    out
}

// An empty table leaves every shape unmatched; a non-empty one must carry the column.
fn ensure_scenario(changes: &[ServiceChange], scenario: &str) -> Result<(), DataError> {
    if changes.is_empty() {
        tracing::warn!(scenario, "change table is empty");
        return Ok(());
    }
    if changes.iter().any(|change| change.has_scenario(scenario)) {
        Ok(())
    } else {
        Err(DataError::UnknownScenario(scenario.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Point;
    use serde_json::json;

    fn shape(code: &str, points: &[(f64, f64)]) -> RouteShape {
        RouteShape {
            code: code.to_string(),
            parts: vec![points.iter().map(|&(x, y)| Point::new(x, y)).collect()],
        }
    }

    fn change(line: &str, c15: &str, c30: &str) -> ServiceChange {
        let mut change = ServiceChange {
            line: line.to_string(),
            area: Some("Oakland".to_string()),
            ..ServiceChange::default()
        };
        change.scenarios.insert("change-15".to_string(), json!(c15));
        change.scenarios.insert("change-30".to_string(), json!(c30));
        change
    }

    #[test]
    fn joins_renames_and_normalizes() {
        let shapes = vec![shape("1", &[(0.0, 0.0)]), shape("72", &[(1.0, 1.0)])];
        let changes = vec![change("1", "", "reduced"), change("72", "increased", " ")];
        let set = build_route_set(shapes, changes, &DataConfig::default()).unwrap();
        assert_eq!(set.routes.len(), 2);
        let brt = set.get("BRT/1").unwrap();
        assert_eq!(brt.category, ChangeCategory::Reduced);
        assert_eq!(set.get("72").unwrap().category, ChangeCategory::NoChange);
        assert!(set.unmatched.is_empty());
    }

    #[test]
    fn unmatched_shapes_default_to_other() {
        let shapes = vec![shape("800", &[(0.0, 0.0)]), shape("72", &[(1.0, 1.0)])];
        let changes = vec![change("72", "", "eliminated")];
        let set = build_route_set(shapes, changes.clone(), &DataConfig::default()).unwrap();
        assert_eq!(set.get("800").unwrap().category, ChangeCategory::Other);
        assert!(set.get("800").unwrap().change.is_none());
        assert_eq!(set.unmatched, vec!["800".to_string()]);

        let config = DataConfig {
            include_unmatched: false,
            ..DataConfig::default()
        };
        let shapes = vec![shape("800", &[(0.0, 0.0)]), shape("72", &[(1.0, 1.0)])];
        let set = build_route_set(shapes, changes, &config).unwrap();
        assert!(set.get("800").is_none());
        assert_eq!(set.unmatched, vec!["800".to_string()]);
    }

    #[test]
    fn merges_shapes_sharing_a_route() {
        let shapes = vec![shape("72", &[(0.0, 0.0)]), shape("72", &[(5.0, 5.0)])];
        let changes = vec![change("72", "", "")];
        let set = build_route_set(shapes, changes, &DataConfig::default()).unwrap();
        assert_eq!(set.routes.len(), 1);
        assert_eq!(set.routes[0].parts.len(), 2);
    }

    #[test]
    fn flex_rows_become_geometryless_routes() {
        let shapes = vec![shape("72", &[(0.0, 0.0)])];
        let changes = vec![
            change("72", "", ""),
            change("Flex Castro Valley", "modified", "eliminated"),
            change("NX9", "", "eliminated"),
        ];
        let set = build_route_set(shapes, changes, &DataConfig::default()).unwrap();
        assert_eq!(set.routes.len(), 2);
        let flex = set.get("Flex Castro Valley").unwrap();
        assert!(!flex.has_geometry());
        assert_eq!(flex.category, ChangeCategory::Eliminated);
        assert!(set.get("NX9").is_none());
    }

    #[test]
    fn rejects_unknown_scenario() {
        let config = DataConfig {
            scenario: "change-45".to_string(),
            ..DataConfig::default()
        };
        let err = build_route_set(vec![], vec![change("72", "", "")], &config).unwrap_err();
        assert!(matches!(err, DataError::UnknownScenario(s) if s == "change-45"));
    }

    #[test]
    fn first_duplicate_row_wins() {
        let shapes = vec![shape("72", &[(0.0, 0.0)]), shape("1", &[(1.0, 1.0)])];
        let changes = vec![
            change("72", "", "reduced"),
            change("72", "", "eliminated"),
            change("1", "", "increased"),
            change("BRT/1", "", "eliminated"),
        ];
        let set = build_route_set(shapes, changes, &DataConfig::default()).unwrap();
        assert_eq!(set.routes.len(), 2);
        assert_eq!(set.get("72").unwrap().category, ChangeCategory::Reduced);
        assert_eq!(set.get("BRT/1").unwrap().category, ChangeCategory::Increased);
    }

    #[test]
    fn empty_table_leaves_every_shape_other() {
        let shapes = vec![shape("72", &[(0.0, 0.0)]), shape("1", &[(1.0, 1.0)])];
        let set = build_route_set(shapes, vec![], &DataConfig::default()).unwrap();
        assert_eq!(set.routes.len(), 2);
        assert!(set.routes.iter().all(|route| route.category == ChangeCategory::Other));
        assert_eq!(set.unmatched, vec!["72".to_string(), "BRT/1".to_string()]);
        assert!(set.with_scenario("change-15").is_ok());
    }

    #[test]
    fn null_column_counts_as_present() {
        let mut row = ServiceChange {
            line: "72".to_string(),
            ..ServiceChange::default()
        };
        row.scenarios.insert("change-30".to_string(), serde_json::Value::Null);
        let set = build_route_set(vec![shape("72", &[(0.0, 0.0)])], vec![row], &DataConfig::default()).unwrap();
        assert_eq!(set.get("72").unwrap().category, ChangeCategory::NoChange);
    }

    #[test]
    fn reclassifies_for_another_scenario() {
        let shapes = vec![shape("72", &[(0.0, 0.0)]), shape("800", &[(1.0, 0.0)])];
        let changes = vec![change("72", "increased", "reduced")];
        let set = build_route_set(shapes, changes, &DataConfig::default()).unwrap();
        assert_eq!(set.get("72").unwrap().category, ChangeCategory::Reduced);
        let fifteen = set.with_scenario("change-15").unwrap();
        assert_eq!(fifteen.scenario, "change-15");
        assert_eq!(fifteen.get("72").unwrap().category, ChangeCategory::Increased);
        assert_eq!(fifteen.get("800").unwrap().category, ChangeCategory::Other);
        assert!(set.with_scenario("change-99").is_err());
    }
}
