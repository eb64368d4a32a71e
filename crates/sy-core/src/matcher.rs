//! # Location Range Matcher
//!
//! Works out which leg(s) of a trip a date range falls into, so a new
//! tripbit can be linked to a stop without asking the user.

use crate::models::TripLocation;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Returns the locations whose closed `[start_date, end_date]` overlaps the
/// candidate range, in the same order as `locations`.
///
/// A missing `start` yields no matches. A missing `end` is treated as a
/// single-day range. Locations without both dates never match.
pub fn find_matching_locations<'a>(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    locations: &'a [TripLocation],
) -> Vec<&'a TripLocation> {
    let Some(start) = start else {
        return Vec::new();
    };
    let end = end.unwrap_or(start);

    locations
        .iter()
        .filter(|loc| match loc.date_range() {
            Some((loc_start, loc_end)) => loc_start <= end && loc_end >= start,
            None => false,
        })
        .collect()
}

/// Orders locations the way the trip timeline shows them: by start date, then
/// end date, then `order_index`. Undated ends sort after dated ones.
pub fn sort_chronologically(locations: &mut [TripLocation]) {
    locations.sort_by(|a, b| {
        cmp_dates_missing_last(a.start_date, b.start_date)
            .then_with(|| cmp_dates_missing_last(a.end_date, b.end_date))
            .then_with(|| a.order_index.cmp(&b.order_index))
    });
}

fn cmp_dates_missing_last(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn leg(name: &str, order_index: i32, start: Option<u32>, end: Option<u32>) -> TripLocation {
        TripLocation {
            id: Uuid::now_v7(),
            trip_id: Uuid::nil(),
            name: name.to_string(),
            order_index,
            start_date: start.map(day),
            end_date: end.map(day),
        }
    }

    fn names(found: &[&TripLocation]) -> Vec<String> {
        found.iter().map(|l| l.name.clone()).collect()
    }

    fn three_legs() -> Vec<TripLocation> {
        vec![
            leg("A", 0, Some(1), Some(5)),
            leg("B", 1, Some(5), Some(10)),
            leg("C", 2, Some(12), Some(15)),
        ]
    }

    #[test]
    fn test_no_start_date_never_matches() {
        let legs = three_legs();
        assert!(find_matching_locations(None, None, &legs).is_empty());
        assert!(find_matching_locations(None, Some(day(3)), &legs).is_empty());
    }

    #[test]
    fn test_undated_locations_never_match() {
        let legs = vec![
            leg("A", 0, None, None),
            leg("B", 1, Some(1), None),
            leg("C", 2, None, Some(30)),
        ];
        assert!(find_matching_locations(Some(day(1)), Some(day(30)), &legs).is_empty());
    }

    #[test]
    fn test_boundary_day_matches_both_adjacent_legs() {
        let legs = three_legs();
        let found = find_matching_locations(Some(day(5)), Some(day(5)), &legs);
        assert_eq!(names(&found), vec!["A", "B"]);
    }

    #[test]
    fn test_missing_end_is_single_day() {
        let legs = three_legs();
        let found = find_matching_locations(Some(day(5)), None, &legs);
        assert_eq!(names(&found), vec!["A", "B"]);

        let found = find_matching_locations(Some(day(13)), None, &legs);
        assert_eq!(names(&found), vec!["C"]);
    }

    #[test]
    fn test_range_outside_every_leg() {
        let legs = three_legs();
        assert!(find_matching_locations(Some(day(20)), Some(day(21)), &legs).is_empty());
        // The gap between B and C
        assert!(find_matching_locations(Some(day(11)), Some(day(11)), &legs).is_empty());
    }

    #[test]
    fn test_single_leg_contains_range() {
        let legs = vec![leg("A", 0, Some(1), Some(5))];
        let found = find_matching_locations(Some(day(2)), Some(day(3)), &legs);
        assert_eq!(names(&found), vec!["A"]);
    }

    #[test]
    fn test_long_range_spans_all_legs_in_input_order() {
        let mut legs = three_legs();
        legs.reverse();
        let found = find_matching_locations(Some(day(1)), Some(day(30)), &legs);
        assert_eq!(names(&found), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_matching_is_repeatable() {
        let legs = three_legs();
        let first = find_matching_locations(Some(day(4)), Some(day(12)), &legs);
        let second = find_matching_locations(Some(day(4)), Some(day(12)), &legs);
        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_sort_chronologically() {
        let mut legs = vec![
            leg("undated", 0, None, None),
            leg("late", 1, Some(12), Some(15)),
            leg("early-long", 2, Some(1), Some(9)),
            leg("early-short", 3, Some(1), Some(3)),
            leg("open-ended", 4, Some(1), None),
            leg("undated-first", -1, None, None),
        ];
        sort_chronologically(&mut legs);
        let order: Vec<&str> = legs.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            order,
            vec!["early-short", "early-long", "open-ended", "late", "undated-first", "undated"]
        );
    }
}
