//! Derivation of the displayed note list.
//!
//! Everything here is pure: the raw list is only read, and each call returns
//! a fresh `Vec`.

use crate::models::Note;
use chrono::{DateTime, Days, Local, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// "Created within" bucket. Boundaries sit on local midnight of today.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum DateRange {
    #[default]
    #[strum(to_string = "All", serialize = "")]
    All,
    #[strum(to_string = "Today")]
    Today,
    #[strum(to_string = "Last 7 Days")]
    Last7Days,
    #[strum(to_string = "Last 30 Days")]
    Last30Days,
    #[strum(to_string = "More than 30 Days")]
    MoreThan30Days,
}

impl DateRange {
    pub fn contains<Tz: TimeZone>(self, created_at: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        match self {
            DateRange::All => true,
            DateRange::Today => *created_at >= midnight_days_back(now, 0),
            DateRange::Last7Days => *created_at >= midnight_days_back(now, 6),
            DateRange::Last30Days => *created_at >= midnight_days_back(now, 29),
            DateRange::MoreThan30Days => *created_at < midnight_days_back(now, 30),
        }
    }
}

/// Local midnight `days` calendar days before `now`'s date, as UTC.
fn midnight_days_back<Tz: TimeZone>(now: &DateTime<Tz>, days: u64) -> DateTime<Utc> {
    let date = now.date_naive();
    let date = date.checked_sub_days(Days::new(days)).unwrap_or(date);
    let naive = date.and_time(NaiveTime::MIN);
    // A DST jump can skip midnight; fall back to reading it as UTC.
    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum SortKey {
    /// Keep the server order.
    #[default]
    #[strum(to_string = "none", serialize = "")]
    None,
    #[strum(to_string = "title-asc")]
    TitleAsc,
    #[strum(to_string = "title-desc")]
    TitleDesc,
    #[strum(to_string = "date-new")]
    DateNewest,
    #[strum(to_string = "date-old")]
    DateOldest,
}

/// Transient filter/sort selection owned by the UI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSortConfig {
    /// Case-insensitive substring of the title.
    pub search: String,
    /// Exact tag membership; `None` or empty passes everything.
    pub tag: Option<String>,
    pub date_range: DateRange,
    pub sort: SortKey,
}

impl FilterSortConfig {
    fn tag_filter(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_identity(&self) -> bool {
        self.search.is_empty()
            && self.tag_filter().is_none()
            && self.date_range == DateRange::All
            && self.sort == SortKey::None
    }
}

/// Locale-aware title order: accents and case are secondary to the base
/// letters, lowercase first on otherwise equal titles.
#[cfg(target_arch = "wasm32")]
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let order = js_sys::JsString::from(a).locale_compare(
        b,
        &js_sys::Array::new(),
        &js_sys::Object::new(),
    );
    order.cmp(&0)
}

/// Locale-aware title order: accents and case are secondary to the base
/// letters, lowercase first on otherwise equal titles.
#[cfg(not(target_arch = "wasm32"))]
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    use icu_collator::{Collator, CollatorOptions};

    thread_local! {
        static COLLATOR: Option<Collator> =
            Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
    }

    COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| b.cmp(a)),
    })
}

/// The visible list for `config`, with date buckets measured against the local clock.
pub fn derive(raw: &[Note], config: &FilterSortConfig) -> Vec<Note> {
    derive_at(raw, config, &Local::now())
}

/// Archived → tag → date bucket → title search → stable sort, in that order.
pub fn derive_at<Tz: TimeZone>(
    raw: &[Note],
    config: &FilterSortConfig,
    now: &DateTime<Tz>,
) -> Vec<Note> {
    let tag = config.tag_filter();
    let needle = config.search.to_lowercase();

    let mut out: Vec<Note> = raw
        .iter()
        .filter(|n| !n.is_archived)
        .filter(|n| tag.map_or(true, |t| n.has_tag(t)))
        .filter(|n| config.date_range.contains(&n.created_at, now))
        .filter(|n| needle.is_empty() || n.title.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    // `sort_by` is stable; equal keys keep their input order.
    match config.sort {
        SortKey::None => {}
        SortKey::TitleAsc => out.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortKey::TitleDesc => out.sort_by(|a, b| compare_titles(&b.title, &a.title)),
        SortKey::DateNewest => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::DateOldest => out.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }

    out
}

/// The archived listing: no filter, no sort.
pub fn archived(raw: &[Note]) -> Vec<Note> {
    raw.iter().filter(|n| n.is_archived).cloned().collect()
}

/// Every tag used by a non-archived note, deduplicated and sorted.
pub fn available_tags(raw: &[Note]) -> Vec<String> {
    raw.iter()
        .filter(|n| !n.is_archived)
        .flat_map(|n| n.tags.iter())
        .filter(|t| !t.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
