//! Time-bucket scaffolds for the sales/purchase chart.
//!
//! A scaffold is built from the period selector and "now" alone; it never
//! looks at data. The series materializer fills it in afterwards using the
//! same [`Period::bucket_key`] function, so keys always line up.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Reporting period selector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// The last 7 UTC days, ending today.
    Weekly,
    /// January to December of the current UTC year.
    #[default]
    Monthly,
    /// The current UTC year and the four before it.
    Yearly,
}

impl Period {
    /// Parse a selector. Matching is exact; anything else, including padded
    /// or upper-case spellings, falls back to `Monthly`.
    pub fn from_selector(selector: &str) -> Self {
        match selector {
            "weekly" => Period::Weekly,
            "yearly" => Period::Yearly,
            _ => Period::Monthly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    /// Number of buckets in a scaffold for this period.
    pub fn bucket_count(&self) -> usize {
        match self {
            Period::Weekly => 7,
            Period::Monthly => 12,
            Period::Yearly => 5,
        }
    }

    /// Key of the bucket a timestamp falls into.
    ///
    /// `YYYY-MM-DD` for weekly, month number (`"1"`..`"12"`) for monthly,
    /// year for yearly.
    pub fn bucket_key(&self, at: DateTime<Utc>) -> String {
        match self {
            Period::Weekly => at.format("%Y-%m-%d").to_string(),
            Period::Monthly => at.month().to_string(),
            Period::Yearly => at.year().to_string(),
        }
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Ordered bucket keys and labels (oldest first) plus the window they cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketScaffold {
    pub period: Period,
    pub keys: Vec<String>,
    pub labels: Vec<String>,
    pub window: TimeWindow,
}

impl BucketScaffold {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Position of `key` in the scaffold.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

/// Build the scaffold for `period`, anchored to `now` in UTC.
pub fn build_buckets(period: Period, now: DateTime<Utc>) -> BucketScaffold {
    match period {
        Period::Weekly => weekly(now),
        Period::Monthly => monthly(now),
        Period::Yearly => yearly(now),
    }
}

fn weekly(now: DateTime<Utc>) -> BucketScaffold {
    let today = now.date_naive();
    let days: Vec<NaiveDate> = (0..7u64)
        .rev()
        .map(|back| today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN))
        .collect();

    let keys = days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    let labels = days.iter().map(|d| d.format("%a").to_string()).collect();
    let start = start_of_day(days[0]);
    let end = today
        .checked_add_days(Days::new(1))
        .map(start_of_day)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    BucketScaffold {
        period: Period::Weekly,
        keys,
        labels,
        window: TimeWindow::new(start, end),
    }
}

fn monthly(now: DateTime<Utc>) -> BucketScaffold {
    let year = now.year();
    BucketScaffold {
        period: Period::Monthly,
        keys: (1..=12).map(|m: u32| m.to_string()).collect(),
        labels: MONTH_LABELS.iter().map(|l| l.to_string()).collect(),
        window: TimeWindow::new(start_of_year(year), start_of_year(year.saturating_add(1))),
    }
}

fn yearly(now: DateTime<Utc>) -> BucketScaffold {
    let current = now.year();
    let years: Vec<i32> = (0..5).map(|i| current - 4 + i).collect();
    let keys: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    BucketScaffold {
        period: Period::Yearly,
        labels: keys.clone(),
        keys,
        window: TimeWindow::new(
            start_of_year(years[0]),
            start_of_year(current.saturating_add(1)),
        ),
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

// Only unrepresentable at chrono's outer year limits.
fn start_of_year(year: i32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(start_of_day)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn unknown_selector_defaults_to_monthly() {
        assert_eq!(Period::from_selector("weekly"), Period::Weekly);
        assert_eq!(Period::from_selector("yearly"), Period::Yearly);
        assert_eq!(Period::from_selector(" YEARLY "), Period::Monthly);
        assert_eq!(Period::from_selector("Weekly"), Period::Monthly);
        assert_eq!(Period::from_selector("quarterly"), Period::Monthly);
        assert_eq!(Period::from_selector(""), Period::Monthly);
    }

    #[test]
    fn weekly_ends_today_and_spans_seven_days() {
        // 2025-06-15 is a Sunday.
        let scaffold = build_buckets(Period::Weekly, at(2025, 6, 15, 18));
        assert_eq!(
            scaffold.keys,
            vec![
                "2025-06-09", "2025-06-10", "2025-06-11", "2025-06-12", "2025-06-13",
                "2025-06-14", "2025-06-15"
            ]
        );
        assert_eq!(
            scaffold.labels,
            vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
        );
        assert_eq!(scaffold.window.start, at(2025, 6, 9, 0));
        assert_eq!(scaffold.window.end, at(2025, 6, 16, 0));
    }

    #[test]
    fn weekly_crosses_month_and_year_boundaries() {
        let scaffold = build_buckets(Period::Weekly, at(2025, 1, 2, 3));
        assert_eq!(scaffold.keys.first().unwrap(), "2024-12-27");
        assert_eq!(scaffold.keys.last().unwrap(), "2025-01-02");
    }

    #[test]
    fn monthly_covers_calendar_year_regardless_of_date() {
        let scaffold = build_buckets(Period::Monthly, at(2025, 3, 10, 0));
        assert_eq!(scaffold.keys.len(), 12);
        assert_eq!(scaffold.keys[0], "1");
        assert_eq!(scaffold.keys[11], "12");
        assert_eq!(scaffold.labels[0], "Jan");
        assert_eq!(scaffold.labels[11], "Dec");
        assert_eq!(scaffold.window.start, at(2025, 1, 1, 0));
        assert_eq!(scaffold.window.end, at(2026, 1, 1, 0));
    }

    #[test]
    fn yearly_is_five_years_ending_now() {
        let scaffold = build_buckets(Period::Yearly, at(2025, 8, 1, 0));
        assert_eq!(scaffold.keys, vec!["2021", "2022", "2023", "2024", "2025"]);
        assert_eq!(scaffold.labels, scaffold.keys);
        assert_eq!(scaffold.window.start, at(2021, 1, 1, 0));
        assert_eq!(scaffold.window.end, at(2026, 1, 1, 0));
    }

    #[test]
    fn window_is_half_open() {
        let scaffold = build_buckets(Period::Monthly, at(2025, 3, 10, 0));
        assert!(scaffold.window.contains(at(2025, 1, 1, 0)));
        assert!(scaffold.window.contains(at(2026, 1, 1, 0) - Duration::milliseconds(1)));
        assert!(!scaffold.window.contains(at(2026, 1, 1, 0)));
    }

    #[test]
    fn bucket_key_matches_scaffold_keys() {
        let now = at(2025, 6, 15, 18);
        for (period, expected) in [(Period::Weekly, 6), (Period::Monthly, 5), (Period::Yearly, 4)] {
            let scaffold = build_buckets(period, now);
            assert_eq!(scaffold.index_of(&period.bucket_key(now)), Some(expected));
        }
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: scaffold sizes are fixed and keys/labels stay aligned.
            #[test]
            fn scaffold_shape_is_fixed(secs in 0i64..4_102_444_800) {
                let now = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
                for period in [Period::Weekly, Period::Monthly, Period::Yearly] {
                    let scaffold = build_buckets(period, now);
                    prop_assert_eq!(scaffold.keys.len(), period.bucket_count());
                    prop_assert_eq!(scaffold.labels.len(), scaffold.keys.len());
                    prop_assert!(scaffold.window.start < scaffold.window.end);
                    prop_assert!(scaffold.window.contains(now));
                }
            }

            /// Property: weekly ends at today's date; yearly ends at the current year.
            #[test]
            fn scaffold_ends_at_now(secs in 0i64..4_102_444_800) {
                let now = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
                let weekly = build_buckets(Period::Weekly, now);
                let today = now.format("%Y-%m-%d").to_string();
                prop_assert_eq!(weekly.keys.last(), Some(&today));
                let yearly = build_buckets(Period::Yearly, now);
                let year = now.year().to_string();
                prop_assert_eq!(yearly.keys.last(), Some(&year));
            }

            /// Property: every instant in the window maps to exactly one scaffold key.
            #[test]
            fn keys_partition_the_window(
                secs in 0i64..4_102_444_800,
                offset_frac in 0.0f64..1.0,
            ) {
                let now = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
                for period in [Period::Weekly, Period::Monthly, Period::Yearly] {
                    let scaffold = build_buckets(period, now);
                    let span = (scaffold.window.end - scaffold.window.start).num_seconds();
                    let probe = scaffold.window.start
                        + Duration::seconds(((span - 1) as f64 * offset_frac) as i64);
                    let key = period.bucket_key(probe);
                    prop_assert_eq!(scaffold.keys.iter().filter(|k| **k == key).count(), 1);
                }
            }
        }
    }
}
