//! Filter/sort engine deriving the display list from the item store.
//!
//! [`derive`] is pure: it borrows the store and returns references in display
//! order, never touching the source slice. All three orderings use a stable
//! sort, so items with equal keys keep their store (arrival) order.

use super::item::{CategoryFilter, FeedItem, SortCriterion};

/// Filter `items` by `filter` and order the survivors by `sort`.
///
/// - `latest`: descending `timestamp`
/// - `rating`: descending `rating` (total order via [`f64::total_cmp`])
/// - `distance`: descending parsed distance, i.e. longest route first;
///   malformed labels order as the sentinel `0.0`
pub fn derive<'a>(
    items: &'a [FeedItem],
    filter: &CategoryFilter,
    sort: SortCriterion,
) -> Vec<&'a FeedItem> {
    let mut result: Vec<&FeedItem> = items.iter().filter(|item| filter.matches(item)).collect();

    // `sort_by` is stable: ties keep their pre-sort relative order
    match sort {
        SortCriterion::Latest => result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortCriterion::Rating => result.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortCriterion::Distance => {
            result.sort_by(|a, b| b.distance_km().total_cmp(&a.distance_km()))
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::item::Category;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const HOUR_MS: i64 = 3_600_000;
    const DAY_MS: i64 = 24 * HOUR_MS;
    const NOW: i64 = 1_760_000_000_000;

    fn ids(list: &[&FeedItem]) -> Vec<String> {
        list.iter().map(|item| item.id.to_string()).collect()
    }

    /// The three launch routes of the explore screen.
    fn launch_routes() -> Vec<FeedItem> {
        vec![
            FeedItem::new("1", "发现", 4.9, "4.5km", NOW - 2 * HOUR_MS),
            FeedItem::new("2", "City Walk", 4.8, "8.2km", NOW - DAY_MS),
            FeedItem::new("3", "徒步登山", 5.0, "15.0km", NOW - 3 * DAY_MS),
        ]
    }

    #[test]
    fn test_latest_orders_newest_first() {
        let items = launch_routes();
        let list = derive(&items, &CategoryFilter::All, SortCriterion::Latest);
        assert_eq!(ids(&list), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_rating_orders_highest_first() {
        let items = launch_routes();
        let list = derive(&items, &CategoryFilter::All, SortCriterion::Rating);
        assert_eq!(ids(&list), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_distance_orders_longest_first() {
        let items = launch_routes();
        let list = derive(&items, &CategoryFilter::All, SortCriterion::Distance);
        assert_eq!(ids(&list), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_category_filter_keeps_only_matching() {
        let items = launch_routes();
        let filter = CategoryFilter::Only(Category::from("City Walk"));
        let list = derive(&items, &filter, SortCriterion::Latest);
        assert_eq!(ids(&list), vec!["2"]);
    }

    #[test]
    fn test_unknown_category_yields_empty() {
        let items = launch_routes();
        let filter = CategoryFilter::Only(Category::from("露营"));
        assert!(derive(&items, &filter, SortCriterion::Rating).is_empty());
    }

    #[test]
    fn test_empty_input() {
        for sort in SortCriterion::ALL {
            assert!(derive(&[], &CategoryFilter::All, sort).is_empty());
        }
    }

    #[test]
    fn test_malformed_distance_sorts_as_zero() {
        let items = vec![
            FeedItem::new("a", "发现", 4.0, "far away", NOW),
            FeedItem::new("b", "发现", 4.0, "0.5km", NOW),
            FeedItem::new("c", "发现", 4.0, "-1km", NOW),
        ];
        let list = derive(&items, &CategoryFilter::All, SortCriterion::Distance);
        assert_eq!(ids(&list), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ties_keep_input_order_for_every_criterion() {
        let items = vec![
            FeedItem::new("x", "发现", 4.5, "5km", NOW),
            FeedItem::new("y", "发现", 4.5, "5km", NOW),
            FeedItem::new("z", "发现", 4.5, "5km", NOW),
        ];
        for sort in SortCriterion::ALL {
            let list = derive(&items, &CategoryFilter::All, sort);
            assert_eq!(ids(&list), vec!["x", "y", "z"], "sort = {sort}");
        }
    }

    fn arb_items() -> impl Strategy<Value = Vec<FeedItem>> {
        let labels = prop::sample::select(vec!["发现", "City Walk", "徒步登山", "骑行"]);
        // Narrow key ranges so ties are common
        prop::collection::vec((labels, 0u8..4, 0u8..4, 0i64..4), 0..24).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (label, rating, km, age))| {
                    FeedItem::new(
                        i.to_string(),
                        label,
                        4.0 + f64::from(rating) * 0.25,
                        format!("{km}.0km"),
                        NOW - age * HOUR_MS,
                    )
                })
                .collect()
        })
    }

    fn arb_filter() -> impl Strategy<Value = CategoryFilter> {
        prop_oneof![
            Just(CategoryFilter::All),
            Just(CategoryFilter::Only(Category::from("City Walk"))),
            Just(CategoryFilter::Only(Category::from("骑行"))),
        ]
    }

    fn arb_sort() -> impl Strategy<Value = SortCriterion> {
        prop::sample::select(SortCriterion::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_derive_is_pure(items in arb_items(), filter in arb_filter(), sort in arb_sort()) {
            let before = items.clone();
            let first: Vec<FeedItem> = derive(&items, &filter, sort).into_iter().cloned().collect();
            let second: Vec<FeedItem> = derive(&items, &filter, sort).into_iter().cloned().collect();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&items, &before);
        }

        #[test]
        fn prop_derive_is_stable(items in arb_items(), filter in arb_filter(), sort in arb_sort()) {
            let list = derive(&items, &filter, sort);
            let position = |item: &FeedItem| items.iter().position(|i| i.id == item.id).unwrap_or(usize::MAX);
            for pair in list.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let tied = match sort {
                    SortCriterion::Latest => a.timestamp == b.timestamp,
                    SortCriterion::Rating => a.rating == b.rating,
                    SortCriterion::Distance => a.distance_km() == b.distance_km(),
                };
                if tied {
                    prop_assert!(position(a) < position(b));
                }
            }
        }

        #[test]
        fn prop_derive_only_returns_matching(items in arb_items(), filter in arb_filter(), sort in arb_sort()) {
            let list = derive(&items, &filter, sort);
            let expected = items.iter().filter(|item| filter.matches(item)).count();
            prop_assert_eq!(list.len(), expected);
            prop_assert!(list.iter().all(|item| filter.matches(item)));
        }
    }
}
