use chrono::{NaiveDate, NaiveDateTime};

use super::model::*;

/// Layouts accepted for an explicit `Date` column, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Turn projected raw rows into an [`EventTable`].
///
/// `columns` lists the whitelisted columns found in the source. When it
/// contains `Date` the date is parsed from that column, otherwise it is
/// rebuilt from `iyear`/`imonth`/`iday`.
pub fn build_table(columns: Vec<String>, rows: Vec<RawRow>) -> EventTable {
    let has_date = columns.iter().any(|c| c == COL_DATE);
    let records = rows
        .iter()
        .map(|row| normalize_row(row, has_date))
        .collect();
    EventTable::new(records, columns)
}

fn normalize_row(row: &RawRow, has_date: bool) -> EventRecord {
    let int = |col: &str| row.get(col).and_then(CellValue::as_i64);
    let float = |col: &str| {
        row.get(col)
            .and_then(CellValue::as_f64)
            .filter(|v| v.is_finite())
    };
    let text = |col: &str| row.get(col).and_then(CellValue::as_text);

    let year = int(COL_YEAR);
    let month = int(COL_MONTH);
    let day = int(COL_DAY);

    let event_date = if has_date {
        row.get(COL_DATE)
            .and_then(CellValue::as_text)
            .and_then(|s| parse_date(&s))
    } else {
        reconstruct_date(year, month, day)
    };

    EventRecord {
        event_id: int(COL_EVENT_ID),
        year,
        month,
        day,
        event_date,
        country: text(COL_COUNTRY),
        region: text(COL_REGION),
        provstate: text(COL_PROVSTATE),
        city: text(COL_CITY),
        latitude: float(COL_LATITUDE),
        longitude: float(COL_LONGITUDE),
        attack_type: text(COL_ATTACK_TYPE),
        target_type: text(COL_TARGET_TYPE),
        weapon_type: text(COL_WEAPON_TYPE),
        group: text(COL_GROUP),
        kill: coerce_count(row.get(COL_KILL)),
        wound: coerce_count(row.get(COL_WOUND)),
        success: int(COL_SUCCESS),
        suicide: int(COL_SUICIDE),
    }
}

/// Coerce a casualty cell to a non-negative finite number; anything else is 0.
pub fn coerce_count(cell: Option<&CellValue>) -> f64 {
    match cell.and_then(CellValue::as_f64) {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Parse an explicit date string; unparsable input yields `None`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Rebuild a date from its parts. A month or day recorded as 0 becomes 1;
/// impossible calendar dates yield `None`.
pub fn reconstruct_date(year: Option<i64>, month: Option<i64>, day: Option<i64>) -> Option<NaiveDate> {
    let year = i32::try_from(year?).ok()?;
    let month = match month? {
        0 => 1,
        m => u32::try_from(m).ok()?,
    };
    let day = match day? {
        0 => 1,
        d => u32::try_from(d).ok()?,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, CellValue)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn counts_are_never_negative() {
        assert_eq!(coerce_count(Some(&CellValue::String("abc".into()))), 0.0);
        assert_eq!(coerce_count(Some(&CellValue::Float(f64::NAN))), 0.0);
        assert_eq!(coerce_count(Some(&CellValue::Integer(-4))), 0.0);
        assert_eq!(coerce_count(Some(&CellValue::Null)), 0.0);
        assert_eq!(coerce_count(None), 0.0);
        assert_eq!(coerce_count(Some(&CellValue::String("12".into()))), 12.0);
    }

    #[test]
    fn zero_month_and_day_default_to_first() {
        let d = reconstruct_date(Some(1999), Some(0), Some(0)).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap());
    }

    #[test]
    fn impossible_calendar_date_is_null() {
        assert_eq!(reconstruct_date(Some(2001), Some(2), Some(30)), None);
        assert_eq!(reconstruct_date(None, Some(2), Some(3)), None);
        assert_eq!(reconstruct_date(Some(2001), Some(-1), Some(3)), None);
    }

    #[test]
    fn explicit_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2014, 3, 9);
        assert_eq!(parse_date("2014-03-09"), expected);
        assert_eq!(parse_date("03/09/2014"), expected);
        assert_eq!(parse_date("2014-03-09 13:45:00"), expected);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn date_column_takes_precedence_over_parts() {
        let columns = vec![COL_YEAR.to_string(), COL_DATE.to_string()];
        let rows = vec![
            row(&[
                (COL_YEAR, CellValue::Integer(1990)),
                (COL_DATE, CellValue::String("2020-05-17".into())),
            ]),
            row(&[
                (COL_YEAR, CellValue::Integer(1990)),
                (COL_DATE, CellValue::String("garbage".into())),
            ]),
        ];
        let table = build_table(columns, rows);
        assert_eq!(
            table.records()[0].event_date,
            NaiveDate::from_ymd_opt(2020, 5, 17)
        );
        assert_eq!(table.records()[1].event_date, None);
    }

    #[test]
    fn missing_optional_columns_are_tolerated() {
        let columns = vec![COL_YEAR.to_string(), COL_MONTH.to_string(), COL_DAY.to_string()];
        let rows = vec![row(&[
            (COL_YEAR, CellValue::Integer(2012)),
            (COL_MONTH, CellValue::Integer(4)),
            (COL_DAY, CellValue::Integer(0)),
        ])];
        let table = build_table(columns, rows);
        let rec = &table.records()[0];
        assert_eq!(rec.event_date, NaiveDate::from_ymd_opt(2012, 4, 1));
        assert_eq!(rec.region, None);
        assert_eq!(rec.kill, 0.0);
        assert_eq!(rec.wound, 0.0);
        assert_eq!(table.unique_values(Category::Region).count(), 0);
    }
}
