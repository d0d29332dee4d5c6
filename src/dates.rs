//! Publication date formatting.
//!
//! Dates are always rendered in one fixed locale chosen in `config.toml`,
//! never the visitor's. The content API sends ISO-8601 timestamps with a
//! colon-less offset (`2021-03-25T19:25:28+0000`); RFC 3339 is accepted too.
//!
//! Nothing here fails: an absent or unparseable date renders as the locale's
//! pending label.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

/// Supported display locales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

const MONTHS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

const MONTHS_EN_US: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl Locale {
    /// BCP 47 tag, used for `<html lang>`.
    pub fn tag(self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::EnUs => "en-US",
        }
    }

    fn month_abbrev(self, month0: u32) -> &'static str {
        let table = match self {
            Locale::PtBr => &MONTHS_PT_BR,
            Locale::EnUs => &MONTHS_EN_US,
        };
        table[month0 as usize % 12]
    }

    /// Shown instead of a date for posts that were never published.
    pub fn pending_label(self) -> &'static str {
        match self {
            Locale::PtBr => "pendente",
            Locale::EnUs => "pending",
        }
    }

    fn edited_prefix(self) -> &'static str {
        match self {
            Locale::PtBr => "editado em",
            Locale::EnUs => "edited on",
        }
    }

    fn at_word(self) -> &'static str {
        match self {
            Locale::PtBr => "às",
            Locale::EnUs => "at",
        }
    }

    pub fn load_more_label(self) -> &'static str {
        match self {
            Locale::PtBr => "Carregar mais posts",
            Locale::EnUs => "Load more posts",
        }
    }

    pub fn loading_label(self) -> &'static str {
        match self {
            Locale::PtBr => "Carregando...",
            Locale::EnUs => "Loading...",
        }
    }

    pub fn exit_preview_label(self) -> &'static str {
        match self {
            Locale::PtBr => "Sair do modo Preview",
            Locale::EnUs => "Exit preview mode",
        }
    }

    pub fn previous_label(self) -> &'static str {
        match self {
            Locale::PtBr => "Post anterior",
            Locale::EnUs => "Previous post",
        }
    }

    pub fn next_label(self) -> &'static str {
        match self {
            Locale::PtBr => "Próximo post",
            Locale::EnUs => "Next post",
        }
    }

    pub fn load_failed_label(self) -> &'static str {
        match self {
            Locale::PtBr => "Não foi possível carregar mais posts. Tente novamente.",
            Locale::EnUs => "Could not load more posts. Try again.",
        }
    }
}

/// Parse a content API timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// `dd MMM yyyy`, e.g. `15 mar 2021`.
fn day_month_year(date: &DateTime<FixedOffset>, locale: Locale) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        locale.month_abbrev(date.month0()),
        date.year()
    )
}

/// The list/detail date label.
///
/// Returns the pending label when the post has no publication date or the
/// timestamp can't be read.
pub fn format_date(raw: Option<&str>, locale: Locale) -> String {
    match raw.and_then(parse_timestamp) {
        Some(date) => day_month_year(&date, locale),
        None => {
            if let Some(raw) = raw {
                tracing::warn!(timestamp = %raw, "unparseable publication date");
            }
            locale.pending_label().to_string()
        }
    }
}

/// Date plus time of day, e.g. `19 mar 2021, às 15:49`.
pub fn format_timestamp(raw: &str, locale: Locale) -> Option<String> {
    let date = parse_timestamp(raw)?;
    Some(format!(
        "{}, {} {:02}:{:02}",
        day_month_year(&date, locale),
        locale.at_word(),
        date.hour(),
        date.minute()
    ))
}

/// The "edited on ..." annotation for posts changed after first publication.
///
/// `None` when the post was never republished (no last date, or it equals
/// the first).
pub fn edited_annotation(first: Option<&str>, last: Option<&str>, locale: Locale) -> Option<String> {
    let last = last?;
    if first == Some(last) {
        return None;
    }
    let when = format_timestamp(last, locale)?;
    Some(format!("{} {}", locale.edited_prefix(), when))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_date_renders_pending_label() {
        assert_eq!(format_date(None, Locale::EnUs), "pending");
        assert_eq!(format_date(None, Locale::PtBr), "pendente");
    }

    #[test]
    fn garbage_date_renders_pending_label() {
        assert_eq!(format_date(Some("yesterday-ish"), Locale::EnUs), "pending");
    }

    #[test]
    fn formats_provider_timestamp_pt_br() {
        assert_eq!(
            format_date(Some("2021-03-15T19:25:28+0000"), Locale::PtBr),
            "15 mar 2021"
        );
    }

    #[test]
    fn formats_rfc3339_timestamp_en_us() {
        assert_eq!(
            format_date(Some("2021-04-02T08:00:00Z"), Locale::EnUs),
            "02 Apr 2021"
        );
    }

    #[test]
    fn timestamp_includes_time_of_day() {
        assert_eq!(
            format_timestamp("2021-03-19T15:49:00+0000", Locale::PtBr).as_deref(),
            Some("19 mar 2021, às 15:49")
        );
    }

    #[test]
    fn edited_annotation_only_when_dates_differ() {
        let first = "2021-03-15T19:25:28+0000";
        assert_eq!(edited_annotation(Some(first), Some(first), Locale::EnUs), None);
        assert_eq!(edited_annotation(Some(first), None, Locale::EnUs), None);
        assert_eq!(
            edited_annotation(Some(first), Some("2021-03-19T15:49:00+0000"), Locale::EnUs)
                .as_deref(),
            Some("edited on 19 Mar 2021, at 15:49")
        );
    }

    #[test]
    fn locale_serializes_as_bcp47_tag() {
        #[derive(Deserialize)]
        struct Wrap {
            locale: Locale,
        }
        let w: Wrap = toml::from_str(r#"locale = "en-US""#).unwrap();
        assert_eq!(w.locale, Locale::EnUs);
        assert_eq!(w.locale.tag(), "en-US");
    }
}
