// Date arithmetic and strftime-style substitution
//
// `%@+1M` style tokens set an anchor date; each following run of format
// directives is rendered against the last anchor before it (or now).

use super::ResolveError;
use chrono::{DateTime, Local, Months, TimeDelta};
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static MATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%@(?P<sign>[+-])(?P<value>\d+)(?P<unit>[YMWDhms])").expect("date math regex")
});

static FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:%[AaBbcdHIjMmpSUWwXxYyZz][^%]*)+").expect("date format regex")
});

/// Expand date math and format runs in `body`
pub fn expand_dates(body: &str, now: DateTime<Local>) -> Result<String, ResolveError> {
    if !body.contains('%') {
        return Ok(body.to_string());
    }

    let anchors = MATH_RE
        .captures_iter(body)
        .map(|caps| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let anchor = shift(now, &caps["sign"], &caps["value"], &caps["unit"])?;
            Ok((start, anchor))
        })
        .collect::<Result<Vec<_>, ResolveError>>()?;

    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for run in FORMAT_RE.find_iter(body) {
        out.push_str(&body[last..run.start()]);
        let anchor = anchors
            .iter()
            .rev()
            .find(|(start, _)| *start < run.start())
            .map_or(now, |(_, anchor)| *anchor);

        // chrono reports bad directives through fmt::Error instead of panicking here
        write!(out, "{}", anchor.format(run.as_str()))
            .map_err(|_| ResolveError::Format(run.as_str().to_string()))?;
        last = run.end();
    }
    out.push_str(&body[last..]);

    Ok(MATH_RE.replace_all(&out, "").into_owned())
}

/// Apply one math token to `now`
fn shift(
    now: DateTime<Local>,
    sign: &str,
    value: &str,
    unit: &str,
) -> Result<DateTime<Local>, ResolveError> {
    let token = format!("%@{}{}{}", sign, value, unit);
    let out_of_range = || ResolveError::DateOutOfRange(token.clone());

    let amount: u32 = value.parse().map_err(|_| out_of_range())?;
    let backwards = sign == "-";

    let shifted = match unit {
        "Y" | "M" => {
            let months = if unit == "Y" {
                amount.checked_mul(12).ok_or_else(out_of_range)?
            } else {
                amount
            };
            if backwards {
                now.checked_sub_months(Months::new(months))
            } else {
                now.checked_add_months(Months::new(months))
            }
        }
        _ => {
            let amount = i64::from(amount);
            let delta = match unit {
                "W" => TimeDelta::try_weeks(amount),
                "D" => TimeDelta::try_days(amount),
                "h" => TimeDelta::try_hours(amount),
                "m" => TimeDelta::try_minutes(amount),
                _ => TimeDelta::try_seconds(amount),
            }
            .ok_or_else(out_of_range)?;
            if backwards {
                now.checked_sub_signed(delta)
            } else {
                now.checked_add_signed(delta)
            }
        }
    };

    shifted.ok_or_else(out_of_range)
}

#[cfg(test)]
#[path = "date_test.rs"]
mod tests;
