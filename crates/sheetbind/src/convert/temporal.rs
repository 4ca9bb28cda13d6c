use chrono::format::{Fixed, Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use sheetbind_common::CellValue;
use sheetbind_spec::ConvertOptions;

use crate::error::ConfigError;

use super::{Converter, ParseFailure};

/// Which temporal scalar a [`TemporalConverter`] handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    DateTime,
    Time,
}

impl TemporalKind {
    fn target(self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::DateTime => "datetime",
            TemporalKind::Time => "time",
        }
    }

    /// Default chrono text pattern.
    fn default_pattern(self) -> &'static str {
        match self {
            TemporalKind::Date => "%Y-%m-%d",
            TemporalKind::DateTime => "%Y-%m-%d %H:%M:%S",
            TemporalKind::Time => "%H:%M:%S",
        }
    }

    /// Default number-format pattern applied to written cells.
    fn default_grid_pattern(self) -> &'static str {
        match self {
            TemporalKind::Date => "yyyy-mm-dd",
            TemporalKind::DateTime => "yyyy-mm-dd hh:mm:ss",
            TemporalKind::Time => "hh:mm:ss",
        }
    }

    /// Relaxed patterns retried when strict parsing fails and `lenient` is on.
    fn lenient_patterns(self) -> &'static [&'static str] {
        match self {
            TemporalKind::Date => &[
                "%Y-%m-%d",
                "%Y/%m/%d",
                "%Y.%m.%d",
                "%Y年%m月%d日",
                "%m/%d/%Y",
            ],
            TemporalKind::DateTime => &[
                "%Y-%m-%d %H:%M:%S",
                "%Y/%m/%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%d %H:%M",
                "%Y年%m月%d日 %H時%M分%S秒",
            ],
            TemporalKind::Time => &["%H:%M:%S", "%H:%M", "%H時%M分%S秒"],
        }
    }
}

/// How offset-carrying timestamps relate to the stored wall-clock time.
/// Stored values are naive; an input with an explicit offset is converted
/// into this zone before the offset is dropped, and an offset-bearing
/// pattern renders the zone's offset on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZoneSpec {
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl TimeZoneSpec {
    /// Wall-clock time of `dt` in this zone. `Local` keeps the reading as
    /// written rather than consulting the system clock.
    fn normalize(self, dt: DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            TimeZoneSpec::Local => dt.naive_local(),
            TimeZoneSpec::Utc => dt.naive_utc(),
            TimeZoneSpec::Fixed(offset) => dt.with_timezone(&offset).naive_local(),
        }
    }

    fn fixed_offset(self) -> Option<FixedOffset> {
        match self {
            TimeZoneSpec::Local => None,
            TimeZoneSpec::Utc => FixedOffset::east_opt(0),
            TimeZoneSpec::Fixed(offset) => Some(offset),
        }
    }

    /// Parse `local`, `utc`, or a fixed offset such as `+09:00`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(TimeZoneSpec::Local),
            "utc" => Some(TimeZoneSpec::Utc),
            other => {
                let (sign, rest) = match other.split_at_checked(1)? {
                    ("+", rest) => (1i32, rest),
                    ("-", rest) => (-1i32, rest),
                    _ => return None,
                };
                let (hh, mm) = rest.split_once(':')?;
                let hours: i32 = hh.parse().ok()?;
                let minutes: i32 = mm.parse().ok()?;
                if hours > 23 || minutes > 59 {
                    return None;
                }
                FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
                    .map(TimeZoneSpec::Fixed)
            }
        }
    }
}

/// Date/datetime/time converter driven by a chrono `%` pattern, with an
/// independently configurable grid number-format pattern.
#[derive(Debug)]
pub struct TemporalConverter {
    kind: TemporalKind,
    pattern: String,
    grid_pattern: String,
    lenient: bool,
    timezone: Option<TimeZoneSpec>,
}

impl TemporalConverter {
    pub fn from_options(
        field: &str,
        kind: TemporalKind,
        opts: &ConvertOptions,
    ) -> Result<Self, ConfigError> {
        let pattern = opts
            .pattern
            .clone()
            .unwrap_or_else(|| kind.default_pattern().to_string());
        if !pattern_is_valid(&pattern) {
            return Err(ConfigError::InvalidPattern {
                field: field.to_string(),
                pattern,
            });
        }
        let timezone = match &opts.timezone {
            Some(value) => Some(TimeZoneSpec::parse(value).ok_or_else(|| {
                ConfigError::InvalidTimezone {
                    field: field.to_string(),
                    value: value.clone(),
                }
            })?),
            None => None,
        };
        // An offset specifier (%z and friends) only makes sense for datetimes
        // with a concrete zone to render; anything else would fail at format
        // time instead of here.
        if pattern_has_offset(&pattern)
            && !(kind == TemporalKind::DateTime
                && timezone.is_some_and(|tz| tz.fixed_offset().is_some()))
        {
            return Err(ConfigError::InvalidPattern {
                field: field.to_string(),
                pattern,
            });
        }
        Ok(Self {
            kind,
            pattern,
            grid_pattern: opts
                .grid_pattern
                .clone()
                .unwrap_or_else(|| kind.default_grid_pattern().to_string()),
            lenient: opts.lenient,
            timezone,
        })
    }

    fn parse_with(&self, text: &str, pattern: &str) -> Option<CellValue> {
        match self.kind {
            TemporalKind::Date => NaiveDate::parse_from_str(text, pattern)
                .ok()
                .map(CellValue::Date),
            TemporalKind::DateTime => {
                // An input carrying its own offset is shifted into the
                // configured zone before the offset is dropped.
                if let Some(zone) = self.timezone
                    && let Ok(dt) = DateTime::parse_from_str(text, pattern)
                {
                    return Some(CellValue::DateTime(zone.normalize(dt)));
                }
                NaiveDateTime::parse_from_str(text, pattern)
                    .ok()
                    .map(CellValue::DateTime)
            }
            TemporalKind::Time => NaiveTime::parse_from_str(text, pattern)
                .ok()
                .map(CellValue::Time),
        }
    }

    fn failure(&self, text: &str) -> ParseFailure {
        ParseFailure::new(text)
            .var("pattern", self.pattern.clone())
            .var("grid_pattern", self.grid_pattern.clone())
    }
}

impl Converter for TemporalConverter {
    fn target(&self) -> &'static str {
        self.kind.target()
    }

    fn from_cell(&self, value: &CellValue) -> Option<CellValue> {
        match (self.kind, value) {
            (TemporalKind::Date, CellValue::Date(_)) => Some(value.clone()),
            (TemporalKind::Date, CellValue::DateTime(dt)) => Some(CellValue::Date(dt.date())),
            (TemporalKind::DateTime, CellValue::DateTime(_)) => Some(value.clone()),
            (TemporalKind::DateTime, CellValue::Date(d)) => {
                Some(CellValue::DateTime(d.and_time(NaiveTime::MIN)))
            }
            (TemporalKind::Time, CellValue::Time(_)) => Some(value.clone()),
            (TemporalKind::Time, CellValue::DateTime(dt)) => Some(CellValue::Time(dt.time())),
            _ => None,
        }
    }

    fn parse(&self, text: &str) -> Result<CellValue, ParseFailure> {
        if let Some(value) = self.parse_with(text, &self.pattern) {
            return Ok(value);
        }
        if self.lenient {
            for pattern in self.kind.lenient_patterns() {
                if let Some(value) = self.parse_with(text, pattern) {
                    return Ok(value);
                }
            }
        }
        Err(self.failure(text))
    }

    fn format(&self, value: &CellValue) -> String {
        match (self.kind, value) {
            (TemporalKind::Date, CellValue::Date(d)) => d.format(&self.pattern).to_string(),
            (TemporalKind::DateTime, CellValue::DateTime(dt)) => {
                if let Some(offset) = self.timezone.and_then(TimeZoneSpec::fixed_offset)
                    && let Some(zoned) = offset.from_local_datetime(dt).single()
                {
                    return zoned.format(&self.pattern).to_string();
                }
                dt.format(&self.pattern).to_string()
            }
            (TemporalKind::Time, CellValue::Time(t)) => t.format(&self.pattern).to_string(),
            (_, other) => other.as_text(),
        }
    }

    fn grid_pattern(&self) -> Option<&str> {
        Some(&self.grid_pattern)
    }
}

/// Reject patterns chrono cannot interpret; formatting with one would error
/// at write time, which is far too late for a configuration mistake.
fn pattern_is_valid(pattern: &str) -> bool {
    StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error))
}

fn pattern_has_offset(pattern: &str) -> bool {
    StrftimeItems::new(pattern).any(|item| {
        matches!(
            item,
            Item::Fixed(
                Fixed::TimezoneName
                    | Fixed::TimezoneOffset
                    | Fixed::TimezoneOffsetZ
                    | Fixed::TimezoneOffsetColon
                    | Fixed::TimezoneOffsetColonZ
                    | Fixed::TimezoneOffsetDoubleColon
                    | Fixed::TimezoneOffsetTripleColon
            )
        )
    })
}
