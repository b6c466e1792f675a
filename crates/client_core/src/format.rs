use chrono::{DateTime, Datelike, NaiveDate};
use thiserror::Error;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

const FRENCH_MONTHS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Jui", "Jui", "Aoû", "Sep", "Oct", "Nov", "Déc",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised bill date '{0}'")]
pub struct DateFormatError(pub String);

/// Calendar date of a bill, whatever form the store kept it in.
pub fn parse_bill_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}

/// Short French form used in the bills table: `2004-04-04` becomes `4 Avr. 04`.
pub fn format_date(raw: &str) -> Result<String, DateFormatError> {
    let date = parse_bill_date(raw).ok_or_else(|| DateFormatError(raw.to_string()))?;
    let month = FRENCH_MONTHS[date.month0() as usize];
    Ok(format!(
        "{} {}. {:02}",
        date.day(),
        month,
        date.year().rem_euclid(100)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_and_day_first_dates() {
        let expected = NaiveDate::from_ymd_opt(2004, 4, 4);
        assert_eq!(parse_bill_date("2004-04-04"), expected);
        assert_eq!(parse_bill_date("2004/04/04"), expected);
        assert_eq!(parse_bill_date("04/04/2004"), expected);
        assert_eq!(parse_bill_date("04-04-2004"), expected);
        assert_eq!(parse_bill_date("2004-04-04T10:00:00+02:00"), expected);
    }

    #[test]
    fn rejects_garbage_and_impossible_dates() {
        assert_eq!(parse_bill_date(""), None);
        assert_eq!(parse_bill_date("hier"), None);
        assert_eq!(parse_bill_date("2004-13-01"), None);
        assert_eq!(parse_bill_date("2003-02-29"), None);
    }

    #[test]
    fn formats_in_short_french_form() {
        assert_eq!(format_date("2004-04-04").as_deref(), Ok("4 Avr. 04"));
        assert_eq!(format_date("2001-01-01").as_deref(), Ok("1 Jan. 01"));
        assert_eq!(format_date("2003-02-28").as_deref(), Ok("28 Fév. 03"));
        assert_eq!(format_date("2024-08-14").as_deref(), Ok("14 Aoû. 24"));
        assert_eq!(format_date("1999-12-31").as_deref(), Ok("31 Déc. 99"));
    }

    #[test]
    fn formatting_reports_the_unparseable_input() {
        assert_eq!(
            format_date("not a date"),
            Err(DateFormatError("not a date".into()))
        );
    }
}
