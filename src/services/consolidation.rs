use indexmap::IndexMap;

use crate::models::BomLine;

/// Merge lines sharing a material identity.
///
/// Quantities are summed, the longest description wins (ties broken by the
/// lexicographically greater text), and the first-seen line keeps its position,
/// category and flags. Summation is done over sorted quantities so the result
/// does not depend on input order.
pub fn consolidate(lines: Vec<BomLine>) -> Vec<BomLine> {
    struct Group {
        first: BomLine,
        quantities: Vec<f64>,
        description: String,
    }

    let mut groups: IndexMap<String, Group> = IndexMap::with_capacity(lines.len());

    for line in lines {
        match groups.get_mut(&line.material_id) {
            Some(group) => {
                group.quantities.push(line.quantity);
                if prefer_description(&line.description, &group.description) {
                    group.description = line.description;
                }
            }
            None => {
                groups.insert(
                    line.material_id.clone(),
                    Group {
                        quantities: vec![line.quantity],
                        description: line.description.clone(),
                        first: line,
                    },
                );
            }
        }
    }

    groups
        .into_values()
        .map(|mut group| {
            group.quantities.sort_by(f64::total_cmp);
            group.first.quantity = group.quantities.iter().sum();
            group.first.description = group.description;
            group.first
        })
        .collect()
}

fn prefer_description(candidate: &str, current: &str) -> bool {
    let (candidate_len, current_len) = (candidate.chars().count(), current.chars().count());
    candidate_len > current_len || (candidate_len == current_len && candidate > current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: f64, description: &str) -> BomLine {
        BomLine {
            material_id: id.to_string(),
            quantity,
            description: description.to_string(),
            category: String::new(),
            is_configured: false,
            is_manual: false,
        }
    }

    fn summary(lines: &[BomLine]) -> Vec<(&str, f64)> {
        lines.iter().map(|l| (l.material_id.as_str(), l.quantity)).collect()
    }

    #[test]
    fn test_merges_duplicates_in_first_seen_order() {
        let merged = consolidate(vec![line("A", 2.0, "a"), line("B", 1.0, "b"), line("A", 3.0, "a")]);
        assert_eq!(summary(&merged), vec![("A", 5.0), ("B", 1.0)]);
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let once = consolidate(vec![line("A", 2.0, "a"), line("B", 1.0, "b"), line("A", 3.0, "a")]);
        let twice = consolidate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_longest_description_wins() {
        let merged = consolidate(vec![
            line("A", 1.0, "Tie"),
            line("A", 1.0, "Cable tie 200 mm"),
            line("A", 1.0, "Cable tie"),
        ]);
        assert_eq!(merged[0].description, "Cable tie 200 mm");
    }

    #[test]
    fn test_description_tie_is_order_independent() {
        let forward = consolidate(vec![line("A", 1.0, "abc"), line("A", 1.0, "abd")]);
        let backward = consolidate(vec![line("A", 1.0, "abd"), line("A", 1.0, "abc")]);
        assert_eq!(forward[0].description, backward[0].description);
    }

    #[test]
    fn test_first_seen_flags_are_kept() {
        let mut configured = line("A", 1.0, "a");
        configured.is_configured = true;
        let merged = consolidate(vec![configured, line("A", 4.0, "a")]);
        assert!(merged[0].is_configured);
        assert_eq!(merged[0].quantity, 5.0);
    }
}
