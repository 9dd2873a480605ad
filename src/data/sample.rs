//! Built-in fallback dataset used whenever the configured source cannot be read.

use super::model::*;
use super::normalize::build_table;

const YEARS: [i64; 5] = [2001, 2005, 2010, 2015, 2019];
const MONTHS: [i64; 5] = [9, 6, 1, 12, 7];
const DAYS: [i64; 5] = [11, 15, 5, 20, 3];
const COUNTRIES: [&str; 5] = ["USA", "Iraq", "India", "Syria", "Nigeria"];
const REGIONS: [&str; 5] = [
    "North America",
    "Middle East & North Africa",
    "South Asia",
    "Middle East & North Africa",
    "Sub-Saharan Africa",
];
const CITIES: [&str; 5] = ["NY", "Baghdad", "Mumbai", "Aleppo", "Lagos"];
const LATITUDES: [f64; 5] = [40.7, 33.3, 19.0, 36.2, 6.5];
const LONGITUDES: [f64; 5] = [-74.0, 44.0, 72.0, 37.0, 3.0];
const ATTACK_TYPES: [&str; 5] = [
    "Bombing/Explosion",
    "Armed Assault",
    "Bombing/Explosion",
    "Assassination",
    "Bombing/Explosion",
];
const TARGET_TYPES: [&str; 5] = ["Civilians", "Military", "Civilians", "Government", "Civilians"];
const WEAPON_TYPES: [&str; 5] = ["Explosives", "Firearms", "Explosives", "Firearms", "Explosives"];
const GROUPS: [&str; 5] = ["Unknown", "Group A", "Group B", "Group C", "Group D"];
const KILLS: [i64; 5] = [3000, 150, 12, 500, 30];
const WOUNDS: [i64; 5] = [6000, 200, 30, 1000, 50];

/// Columns carried by the sample (no `provstate`, no `Date`).
const SAMPLE_COLUMNS: [&str; 17] = [
    COL_EVENT_ID,
    COL_YEAR,
    COL_MONTH,
    COL_DAY,
    COL_COUNTRY,
    COL_REGION,
    COL_CITY,
    COL_LATITUDE,
    COL_LONGITUDE,
    COL_ATTACK_TYPE,
    COL_TARGET_TYPE,
    COL_WEAPON_TYPE,
    COL_GROUP,
    COL_KILL,
    COL_WOUND,
    COL_SUCCESS,
    COL_SUICIDE,
];

/// The five-row sample table, normalized through the same path as real data.
pub fn sample_table() -> EventTable {
    let text = |s: &str| CellValue::String(s.to_string());

    let rows = (0..5)
        .map(|i| {
            let cells = [
                (COL_EVENT_ID, CellValue::Integer(i as i64 + 1)),
                (COL_YEAR, CellValue::Integer(YEARS[i])),
                (COL_MONTH, CellValue::Integer(MONTHS[i])),
                (COL_DAY, CellValue::Integer(DAYS[i])),
                (COL_COUNTRY, text(COUNTRIES[i])),
                (COL_REGION, text(REGIONS[i])),
                (COL_CITY, text(CITIES[i])),
                (COL_LATITUDE, CellValue::Float(LATITUDES[i])),
                (COL_LONGITUDE, CellValue::Float(LONGITUDES[i])),
                (COL_ATTACK_TYPE, text(ATTACK_TYPES[i])),
                (COL_TARGET_TYPE, text(TARGET_TYPES[i])),
                (COL_WEAPON_TYPE, text(WEAPON_TYPES[i])),
                (COL_GROUP, text(GROUPS[i])),
                (COL_KILL, CellValue::Integer(KILLS[i])),
                (COL_WOUND, CellValue::Integer(WOUNDS[i])),
                (COL_SUCCESS, CellValue::Integer(1)),
                (COL_SUICIDE, CellValue::Integer(0)),
            ];
            cells
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<RawRow>()
        })
        .collect();

    let columns = SAMPLE_COLUMNS.iter().map(|c| c.to_string()).collect();
    build_table(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn sample_has_five_dated_rows() {
        let table = sample_table();
        assert_eq!(table.len(), 5);
        assert!(table.records().iter().all(|r| r.event_date.is_some()));
        assert_eq!(
            table.records()[0].event_date,
            NaiveDate::from_ymd_opt(2001, 9, 11)
        );
        assert!(!table.has_column(COL_PROVSTATE));
        assert!(!table.has_column(COL_DATE));
    }

    #[test]
    fn sample_regions_are_indexed() {
        let table = sample_table();
        let regions: Vec<&str> = table.unique_values(Category::Region).collect();
        assert_eq!(regions.len(), 4);
        assert_eq!(table.casualty_ceiling(), 9000.0);
    }
}
