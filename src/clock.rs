//! Source of the store-local calendar date.

use time::{
    Date, OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

/// `YYYY-MM-DD`, the key format of every score history.
pub const DATE_KEY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Provides "today" for score keys, streaks and weekly windows.
pub trait Clock: Send + Sync {
    /// Current calendar date in the store-local offset.
    fn today(&self) -> Date;
}

/// Wall clock shifted to the configured store-local offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// Clock whose day boundary sits at midnight in `offset`.
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.offset).date()
    }
}

/// Clock frozen on a given date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

/// Format a date as a score history key.
pub fn date_key(date: Date) -> String {
    date.format(DATE_KEY_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Parse a score history key; `None` for keys that are not `YYYY-MM-DD`.
pub fn parse_date_key(key: &str) -> Option<Date> {
    Date::parse(key, DATE_KEY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn date_key_is_zero_padded() {
        assert_eq!(date_key(date!(2024 - 03 - 05)), "2024-03-05");
    }

    #[test]
    fn parse_date_key_rejects_garbage() {
        assert_eq!(parse_date_key("2024-03-05"), Some(date!(2024 - 03 - 05)));
        assert_eq!(parse_date_key("2024-3-5"), None);
        assert_eq!(parse_date_key("yesterday"), None);
    }

    #[test]
    fn fixed_clock_returns_its_date() {
        assert_eq!(FixedClock(date!(2024 - 01 - 01)).today(), date!(2024 - 01 - 01));
    }
}
