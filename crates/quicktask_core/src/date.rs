//! Human date text to instants.
//!
//! Resolution tries, in order: a relative keyword (`today`, `tomorrow`, `tmr`,
//! `next <weekday>`), a full `day month year hh:mm:ss`, the same without a
//! time (end of day), and finally the same with the current year filled in.

use thiserror::Error;
use time::macros::{format_description, time};
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, Weekday};

/// Time of day given to dates written without one.
pub const DAY_END: Time = time!(23:59:59);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read '{0}' as a date")]
pub struct DateFormatError(pub String);

/// Resolves `text` against `now`; the result carries `now`'s offset.
pub fn resolve(text: &str, now: OffsetDateTime) -> Result<OffsetDateTime, DateFormatError> {
    let cleaned = normalize(text);
    if cleaned.is_empty() {
        return Err(DateFormatError(text.trim().to_string()));
    }

    let offset = now.offset();
    if let Some(day) = relative_day(&cleaned, now.date()) {
        return Ok(end_of_day(day, offset));
    }

    let candidates = [cleaned.clone(), with_year(&cleaned, now.year())];
    candidates
        .iter()
        .find_map(|candidate| {
            parse_strict(candidate)
                .or_else(|| parse_day(candidate).map(|day| PrimitiveDateTime::new(day, DAY_END)))
        })
        .map(|datetime| datetime.assume_offset(offset))
        .ok_or_else(|| DateFormatError(text.trim().to_string()))
}

fn end_of_day(day: Date, offset: UtcOffset) -> OffsetDateTime {
    PrimitiveDateTime::new(day, DAY_END).assume_offset(offset)
}

/// Calendar-date equality, judged in `reference`'s offset.
pub fn same_day(instant: OffsetDateTime, reference: OffsetDateTime) -> bool {
    instant.to_offset(reference.offset()).date() == reference.date()
}

/// ISO week equality (Monday first, ISO year), judged in `reference`'s offset.
pub fn same_week(instant: OffsetDateTime, reference: OffsetDateTime) -> bool {
    let (year, week, _) = instant.to_offset(reference.offset()).to_iso_week_date();
    let (ref_year, ref_week, _) = reference.to_iso_week_date();
    year == ref_year && week == ref_week
}

fn parse_strict(text: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        text,
        format_description!(
            "[day padding:none] [month repr:short case_sensitive:false] [year] [hour padding:none]:[minute]:[second]"
        ),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            text,
            format_description!(
                "[day padding:none] [month repr:long case_sensitive:false] [year] [hour padding:none]:[minute]:[second]"
            ),
        )
    })
    .ok()
}

fn parse_day(text: &str) -> Option<Date> {
    Date::parse(
        text,
        format_description!("[day padding:none] [month repr:short case_sensitive:false] [year]"),
    )
    .or_else(|_| {
        Date::parse(
            text,
            format_description!("[day padding:none] [month repr:long case_sensitive:false] [year]"),
        )
    })
    .ok()
}

fn normalize(text: &str) -> String {
    let mut words: Vec<String> = text
        .split_whitespace()
        .map(|word| word.to_ascii_lowercase())
        .collect();

    if let Some(last) = words.last_mut()
        && let Some(clock) = normalize_time(last)
    {
        *last = clock;
    }

    words.join(" ")
}

/// `3pm`, `3:30pm`, `12am` and `15:30` become `HH:MM:SS`. Anything else is left alone.
fn normalize_time(token: &str) -> Option<String> {
    let (body, meridiem) = if let Some(body) = token.strip_suffix("am") {
        (body, Some(false))
    } else if let Some(body) = token.strip_suffix("pm") {
        (body, Some(true))
    } else {
        (token, None)
    };

    let mut parts = body.split(':');
    let hour: u8 = parts.next()?.parse().ok()?;
    let minute: u8 = match parts.next() {
        Some(minute) if minute.len() == 2 => minute.parse().ok()?,
        Some(_) => return None,
        None if meridiem.is_some() => 0,
        None => return None,
    };
    let second: u8 = match parts.next() {
        Some(second) if meridiem.is_none() && second.len() == 2 => second.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };
    if parts.next().is_some() || minute > 59 || second > 59 {
        return None;
    }

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (hour, true) => hour + 12,
                (hour, false) => hour,
            }
        }
        None if hour < 24 => hour,
        None => return None,
    };

    Some(format!("{hour:02}:{minute:02}:{second:02}"))
}

fn with_year(text: &str, year: i32) -> String {
    match text.rsplit_once(' ') {
        Some((head, clock)) if clock.contains(':') => format!("{head} {year} {clock}"),
        _ => format!("{text} {year}"),
    }
}

fn relative_day(text: &str, today: Date) -> Option<Date> {
    match text {
        "today" => return Some(today),
        "tomorrow" | "tmr" => return today.next_day(),
        _ => {}
    }

    let weekday = weekday_from_name(text.strip_prefix("next ")?.trim())?;
    let ahead = (weekday.number_days_from_monday() + 6 - today.weekday().number_days_from_monday())
        % 7
        + 1;
    today.checked_add(Duration::days(i64::from(ahead)))
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let weekday = match name {
        "mon" | "monday" => Weekday::Monday,
        "tue" | "tues" | "tuesday" => Weekday::Tuesday,
        "wed" | "weds" | "wednesday" => Weekday::Wednesday,
        "thu" | "thur" | "thurs" | "thursday" => Weekday::Thursday,
        "fri" | "friday" => Weekday::Friday,
        "sat" | "saturday" => Weekday::Saturday,
        "sun" | "sunday" => Weekday::Sunday,
        _ => return None,
    };
    Some(weekday)
}
