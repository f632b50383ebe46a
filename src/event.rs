//! Event data model.
//!
//! An [`Event`] is an annually recurring observance day: a stable Wikidata
//! Q-ID, a localized title, and a month/day recurrence. Events optionally
//! carry a detailed extension ([`EventDetails`]) that is fetched separately
//! from the basic fields.
//!
//! Events are immutable value objects: every read constructs them fresh and
//! updates replace them wholesale.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Days per month, index 0 = January. February uses the leap-year maximum
/// because the recurrence has no year component.
const MONTH_LENGTHS: [u8; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid recurrence date: month {month}, day {day}")]
pub struct InvalidMonthDay {
    pub month: u8,
    pub day: u8,
}

/// An annual recurrence: a month and a day of month, no year.
///
/// February 29 is accepted; callers resolving it to a concrete year get
/// `None` from [`MonthDay::in_year`] for non-leap years.
///
/// # Example
///
/// ```
/// use observance_engine::MonthDay;
///
/// let md = MonthDay::new(3, 20).unwrap();
/// assert_eq!(md.month(), 3);
/// assert_eq!(md.day(), 20);
///
/// assert!(MonthDay::new(2, 30).is_err());
/// assert!(MonthDay::new(13, 1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonthDay")]
pub struct MonthDay {
    month: u8,
    day: u8,
}

#[derive(Deserialize)]
struct RawMonthDay {
    month: u8,
    day: u8,
}

impl TryFrom<RawMonthDay> for MonthDay {
    type Error = InvalidMonthDay;

    fn try_from(raw: RawMonthDay) -> Result<Self, Self::Error> {
        MonthDay::new(raw.month, raw.day)
    }
}

impl MonthDay {
    /// Validate and construct a recurrence. The day must exist in the given
    /// month (Feb 29 counts as existing).
    pub fn new(month: u8, day: u8) -> Result<Self, InvalidMonthDay> {
        if !(1..=12).contains(&month) || day < 1 || day > MONTH_LENGTHS[month as usize - 1] {
            return Err(InvalidMonthDay { month, day });
        }
        Ok(Self { month, day })
    }

    #[must_use]
    pub fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    pub fn day(&self) -> u8 {
        self.day
    }

    /// The concrete date of this recurrence in `year`, or `None` when the
    /// year has no such date (Feb 29 outside leap years).
    #[must_use]
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, u32::from(self.month), u32::from(self.day))
    }

    /// The next occurrence on or after `today`. Years without the date
    /// (Feb 29) are skipped.
    #[must_use]
    pub fn next_occurrence(&self, today: NaiveDate) -> NaiveDate {
        let mut year = today.year();
        if self.is_past_in_year_of(today) {
            year += 1;
        }
        loop {
            if let Some(date) = self.in_year(year) {
                return date;
            }
            year += 1;
        }
    }

    /// The most recent occurrence strictly before `today`, except that an
    /// occurrence falling on `today` itself belongs to
    /// [`next_occurrence`](Self::next_occurrence).
    #[must_use]
    pub fn previous_occurrence(&self, today: NaiveDate) -> NaiveDate {
        let mut year = today.year();
        if !self.is_past_in_year_of(today) {
            year -= 1;
        }
        loop {
            if let Some(date) = self.in_year(year) {
                return date;
            }
            year -= 1;
        }
    }

    /// Whether this year's occurrence is already over, relative to `today`.
    fn is_past_in_year_of(&self, today: NaiveDate) -> bool {
        u32::from(self.month) < today.month()
            || (u32::from(self.month) == today.month() && u32::from(self.day) < today.day())
    }
}

/// The detailed extension of an event. Present only as a whole: an event
/// either went through a detailed fetch (and has this struct, possibly with
/// every field `None`) or it did not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// URL of the Wikipedia article about this event.
    pub article_url: Option<String>,
    /// Plain-text introduction of the article, filled in by enrichment.
    pub article_intro: Option<String>,
    /// Date the observance was established.
    pub inception: Option<NaiveDate>,
    /// Founder of the observance.
    pub founder: Option<String>,
}

/// An annually recurring observance day.
///
/// Two events are the *same entity* when their ids match
/// ([`same_entity`](Event::same_entity)); they are *unchanged* only when
/// every field matches (`==`), including detailedness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Wikidata Q-ID, such as `Q5305947`.
    id: String,
    /// Localized title, such as "International Day of Happiness".
    title: String,
    /// Annual recurrence.
    month_day: MonthDay,
    /// Detailed extension, present only after a detailed fetch.
    details: Option<EventDetails>,
}

impl Event {
    /// An event carrying basic fields only.
    pub fn basic(id: impl Into<String>, title: impl Into<String>, month_day: MonthDay) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            month_day,
            details: None,
        }
    }

    /// An event that went through a detailed fetch. The extension may have
    /// every field empty; the event still counts as detailed.
    pub fn detailed(
        id: impl Into<String>,
        title: impl Into<String>,
        month_day: MonthDay,
        details: EventDetails,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            month_day,
            details: Some(details),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn month_day(&self) -> MonthDay {
        self.month_day
    }

    #[must_use]
    pub fn details(&self) -> Option<&EventDetails> {
        self.details.as_ref()
    }

    /// True only if the detail fields were populated through a detailed
    /// fetch. Emptiness of individual detail fields does not matter.
    #[must_use]
    pub fn is_detailed(&self) -> bool {
        self.details.is_some()
    }

    #[must_use]
    pub fn article_url(&self) -> Option<&str> {
        self.details.as_ref()?.article_url.as_deref()
    }

    /// Identity equality: same entity iff ids match.
    #[must_use]
    pub fn same_entity(&self, other: &Event) -> bool {
        self.id == other.id
    }

    /// The basic projection of this event, stripping any detail extension.
    #[must_use]
    pub fn to_basic(&self) -> Event {
        Event::basic(self.id.clone(), self.title.clone(), self.month_day)
    }

    /// A copy with the article introduction attached. No-op on an event
    /// without a detail extension.
    #[must_use]
    pub fn with_article_intro(mut self, intro: impl Into<String>) -> Event {
        if let Some(details) = self.details.as_mut() {
            details.article_intro = Some(intro.into());
        }
        self
    }

    /// See [`MonthDay::next_occurrence`].
    #[must_use]
    pub fn next_occurrence(&self, today: NaiveDate) -> NaiveDate {
        self.month_day.next_occurrence(today)
    }

    /// See [`MonthDay::previous_occurrence`].
    #[must_use]
    pub fn previous_occurrence(&self, today: NaiveDate) -> NaiveDate {
        self.month_day.previous_occurrence(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(month: u8, day: u8) -> MonthDay {
        MonthDay::new(month, day).unwrap()
    }

    #[test]
    fn test_month_day_bounds() {
        assert!(MonthDay::new(1, 31).is_ok());
        assert!(MonthDay::new(4, 31).is_err());
        assert!(MonthDay::new(2, 29).is_ok());
        assert!(MonthDay::new(2, 30).is_err());
        assert!(MonthDay::new(0, 1).is_err());
        assert!(MonthDay::new(13, 1).is_err());
        assert!(MonthDay::new(6, 0).is_err());
    }

    #[test]
    fn test_in_year_leap_handling() {
        let leap_day = md(2, 29);
        assert!(leap_day.in_year(2024).is_some());
        assert!(leap_day.in_year(2025).is_none());
    }

    #[test]
    fn test_next_occurrence_same_year() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let date = md(3, 20).next_occurrence(today);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
    }

    #[test]
    fn test_next_occurrence_rolls_to_next_year() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let date = md(3, 20).next_occurrence(today);
        assert_eq!(date, NaiveDate::from_ymd_opt(2027, 3, 20).unwrap());
    }

    #[test]
    fn test_next_occurrence_today_counts() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let date = md(3, 20).next_occurrence(today);
        assert_eq!(date, today);
    }

    #[test]
    fn test_previous_occurrence() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let date = md(3, 20).previous_occurrence(today);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());

        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let date = md(3, 20).previous_occurrence(today);
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
    }

    #[test]
    fn test_occurrences_skip_non_leap_years() {
        let leap_day = md(2, 29);
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(
            leap_day.next_occurrence(today),
            NaiveDate::from_ymd_opt(2028, 2, 29).unwrap()
        );
        assert_eq!(
            leap_day.previous_occurrence(today),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_identity_vs_value_equality() {
        let a = Event::basic("Q1", "World Day", md(3, 20));
        let b = Event::basic("Q1", "Renamed Day", md(3, 20));
        let c = Event::basic("Q2", "World Day", md(3, 20));

        assert!(a.same_entity(&b));
        assert!(!a.same_entity(&c));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_detailed_with_empty_fields_is_detailed() {
        let event = Event::detailed("Q1", "World Day", md(3, 20), EventDetails::default());
        assert!(event.is_detailed());
        assert!(event.article_url().is_none());
    }

    #[test]
    fn test_detailedness_participates_in_value_equality() {
        let basic = Event::basic("Q1", "World Day", md(3, 20));
        let detailed = Event::detailed("Q1", "World Day", md(3, 20), EventDetails::default());
        assert_ne!(basic, detailed);
        assert_eq!(detailed.to_basic(), basic);
    }

    #[test]
    fn test_with_article_intro() {
        let detailed = Event::detailed(
            "Q1",
            "World Day",
            md(3, 20),
            EventDetails {
                article_url: Some("https://en.wikipedia.org/wiki/World_Day".into()),
                ..EventDetails::default()
            },
        );
        let enriched = detailed.with_article_intro("An observance.");
        assert_eq!(
            enriched.details().unwrap().article_intro.as_deref(),
            Some("An observance.")
        );

        // No detail extension, nothing to attach to.
        let basic = Event::basic("Q1", "World Day", md(3, 20));
        assert!(!basic.with_article_intro("text").is_detailed());
    }

    #[test]
    fn test_serialize_round_trip() {
        let event = Event::detailed(
            "Q5305947",
            "International Day of Happiness",
            md(3, 20),
            EventDetails {
                article_url: Some("https://en.wikipedia.org/wiki/X".into()),
                article_intro: None,
                inception: NaiveDate::from_ymd_opt(2012, 6, 28),
                founder: Some("United Nations".into()),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_deserialize_rejects_invalid_month_day() {
        let json = r#"{"month": 2, "day": 31}"#;
        let result: Result<MonthDay, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
