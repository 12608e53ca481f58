// Tests for date math and formatting
#![cfg_attr(coverage_nightly, coverage(off))]

use super::*;
use chrono::TimeZone;

fn at(y: i32, m: u32, d: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, m, d, 12, 0, 0).single().unwrap()
}

#[test]
fn test_month_math() {
    let now = at(2024, 3, 15);
    assert_eq!(expand_dates("%@+1M%Y-%m-%d", now).unwrap(), "2024-04-15");
}

#[test]
fn test_month_overflow_carries_into_year() {
    let now = at(2024, 3, 15);
    assert_eq!(expand_dates("%@+11M%Y-%m", now).unwrap(), "2025-02");
}

#[test]
fn test_month_end_is_clamped() {
    let now = at(2024, 1, 31);
    assert_eq!(expand_dates("%@+1M%Y-%m-%d", now).unwrap(), "2024-02-29");
}

#[test]
fn test_subtraction_and_other_units() {
    let now = at(2024, 3, 15);
    assert_eq!(expand_dates("%@-1Y%Y", now).unwrap(), "2023");
    assert_eq!(expand_dates("%@+2W%d", now).unwrap(), "29");
    assert_eq!(expand_dates("%@-15D%m/%d", now).unwrap(), "02/29");
    assert_eq!(expand_dates("%@+13h%H", now).unwrap(), "01");
}

#[test]
fn test_plain_format_uses_now() {
    let now = at(2024, 3, 15);
    assert_eq!(
        expand_dates("Today is %A, %B %d.", now).unwrap(),
        "Today is Friday, March 15."
    );
}

#[test]
fn test_each_run_uses_last_preceding_anchor() {
    let now = at(2024, 3, 15);
    let body = "from %d to %@+1D%d then %@+1W%d";
    assert_eq!(expand_dates(body, now).unwrap(), "from 15 to 16 then 22");
}

#[test]
fn test_math_tokens_removed_without_format() {
    let now = at(2024, 3, 15);
    assert_eq!(expand_dates("a%@+1Db", now).unwrap(), "ab");
}

#[test]
fn test_text_without_tokens_untouched() {
    let now = at(2024, 3, 15);
    assert_eq!(expand_dates("100% sure", now).unwrap(), "100% sure");
    assert_eq!(expand_dates("no dates", now).unwrap(), "no dates");
}

#[test]
fn test_out_of_range_math_is_error() {
    let now = at(2024, 3, 15);
    let result = expand_dates("%@+99999999999Y%Y", now);
    assert!(matches!(result, Err(ResolveError::DateOutOfRange(_))));
}
