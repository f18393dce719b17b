use chrono::{DateTime, Duration, NaiveDate, TimeZone};

/// This is the standard way of converting a date to a string in daytally.
pub fn date_to_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Returns the calendar day following `date`. Works on dates, not on 24 hour offsets, so days
/// shortened or lengthened by daylight saving keep their identity.
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().expect("End of time should never happen")
}

/// Local calendar date of an instant in the given time zone.
pub fn day_of<Tz: TimeZone>(instant: DateTime<Tz>) -> NaiveDate {
    instant.date_naive()
}

/// Formats a duration the way it is shown to a user.
pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::{day_of, format_duration, next_day};

    #[test]
    fn next_day_crosses_month_and_year() {
        assert_eq!(
            next_day(NaiveDate::from_ymd_opt(2016, 4, 30).unwrap()),
            NaiveDate::from_ymd_opt(2016, 5, 1).unwrap()
        );
        assert_eq!(
            next_day(NaiveDate::from_ymd_opt(2016, 12, 31).unwrap()),
            NaiveDate::from_ymd_opt(2017, 1, 1).unwrap()
        );
    }

    #[test]
    fn day_of_strips_time() {
        let instant = Utc.with_ymd_and_hms(2016, 4, 23, 23, 59, 59).unwrap();
        assert_eq!(day_of(instant), NaiveDate::from_ymd_opt(2016, 4, 23).unwrap());
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(Duration::minutes(107)), "1h47m0s");
        assert_eq!(format_duration(Duration::seconds(65)), "1m5s");
        assert_eq!(format_duration(Duration::seconds(9)), "9s");
    }
}
