use crate::BrowserConfig;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How a large ordered child collection is split into container nodes.
/// Pure data, derived from the item count alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingInfo {
    pub container_count: usize,
    pub collapse_unit_size: usize,
}

/// Compute the two-level collapsing scheme for `item_count` children.
///
/// Starts from the base unit and grows it by base-unit increments until
/// either the number of top-level containers drops to the threshold or the
/// unit itself reaches the threshold cap. A few oversized buckets are
/// preferred over an unbounded number of top-level tree nodes.
///
/// Deterministic and side-effect-free: identical inputs always yield
/// identical results.
pub fn grouping_info(item_count: usize, config: &BrowserConfig) -> GroupingInfo {
    let mut unit = config.collapse_unit_size.max(1);
    let mut containers = item_count.div_ceil(unit);

    while containers > config.collapse_unit_threshold && unit < config.collapse_unit_threshold {
        unit += config.collapse_unit_size;
        containers = item_count.div_ceil(unit);
    }

    GroupingInfo {
        container_count: containers,
        collapse_unit_size: unit,
    }
}

/// Contiguous sub-ranges covering `0..item_count`, one per container.
pub fn container_ranges(
    item_count: usize,
    info: &GroupingInfo,
) -> impl Iterator<Item = Range<usize>> + '_ {
    let unit = info.collapse_unit_size.max(1);
    (0..info.container_count).map(move |i| {
        let start = i * unit;
        start..((start + unit).min(item_count))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> BrowserConfig {
        BrowserConfig::default()
    }

    #[test]
    fn small_counts_stay_on_the_base_unit() {
        let info = grouping_info(1200, &config());
        assert_eq!(info.collapse_unit_size, 500);
        assert_eq!(info.container_count, 3);
    }

    #[test]
    fn container_count_matches_ceil_division() {
        for count in [0, 1, 499, 500, 501, 10_000, 999_999, 5_000_000] {
            let info = grouping_info(count, &config());
            assert_eq!(
                info.container_count,
                count.div_ceil(info.collapse_unit_size),
                "item_count={count}"
            );
        }
    }

    #[test]
    fn unit_is_a_multiple_of_the_base_unit() {
        for count in [0, 700_000, 1_000_000, 50_000_000] {
            let info = grouping_info(count, &config());
            assert_eq!(info.collapse_unit_size % 500, 0, "item_count={count}");
        }
    }

    #[test]
    fn unit_is_monotonically_non_decreasing() {
        let mut last_unit = 0;
        for count in (0..5_000_000).step_by(123_457) {
            let info = grouping_info(count, &config());
            assert!(
                info.collapse_unit_size >= last_unit,
                "unit shrank at item_count={count}"
            );
            last_unit = info.collapse_unit_size;
        }
    }

    #[test]
    fn unit_growth_is_capped_at_the_threshold() {
        // Far beyond threshold^2: the unit stops at the cap and the
        // container count is allowed to exceed the threshold.
        let info = grouping_info(10_000_000, &config());
        assert_eq!(info.collapse_unit_size, 1000);
        assert!(info.container_count > 1000);
    }

    #[test]
    fn zero_items_yield_zero_containers() {
        let info = grouping_info(0, &config());
        assert_eq!(info.container_count, 0);
        assert_eq!(container_ranges(0, &info).count(), 0);
    }

    #[test]
    fn ranges_partition_the_collection() {
        let count = 2750;
        let info = grouping_info(count, &config());
        let ranges: Vec<_> = container_ranges(count, &info).collect();
        assert_eq!(ranges.len(), info.container_count);
        assert_eq!(ranges.first().map(|r| r.start), Some(0));
        assert_eq!(ranges.last().map(|r| r.end), Some(count));
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}
