use crate::ir::RouteFeature;
use crate::theme::CategoryPalette;
use std::cmp::Ordering;

/// Order in which routes claim label space: ascending category rank, then
/// descending route id. Stable, so equal keys keep input order.
pub fn placement_order<'a>(routes: &'a [RouteFeature], palette: &CategoryPalette) -> Vec<&'a RouteFeature> {
    let mut ordered: Vec<&RouteFeature> = routes.iter().collect();
    ordered.sort_by(|a, b| {
        palette
            .rank(a.category)
            .cmp(&palette.rank(b.category))
            .then_with(|| compare_route_ids_desc(&a.route, &b.route))
    });
    ordered
}

/// Numeric ids first, largest value first; then the rest in reverse lexical order.
pub fn compare_route_ids_desc(a: &str, b: &str) -> Ordering {
    match (numeric_id(a), numeric_id(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}

/// Natural ascending order for listings: numeric ids by value, then the rest
/// lexically.
pub fn compare_route_ids_asc(a: &str, b: &str) -> Ordering {
    match (numeric_id(a), numeric_id(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numeric_id(id: &str) -> Option<f64> {
    id.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}
