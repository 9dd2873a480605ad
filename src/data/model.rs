use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Column whitelist
// ---------------------------------------------------------------------------

pub const COL_EVENT_ID: &str = "eventid";
pub const COL_YEAR: &str = "iyear";
pub const COL_MONTH: &str = "imonth";
pub const COL_DAY: &str = "iday";
pub const COL_COUNTRY: &str = "country_txt";
pub const COL_REGION: &str = "region_txt";
pub const COL_PROVSTATE: &str = "provstate";
pub const COL_CITY: &str = "city";
pub const COL_LATITUDE: &str = "latitude";
pub const COL_LONGITUDE: &str = "longitude";
pub const COL_ATTACK_TYPE: &str = "attacktype1_txt";
pub const COL_TARGET_TYPE: &str = "targtype1_txt";
pub const COL_WEAPON_TYPE: &str = "weaptype1_txt";
pub const COL_GROUP: &str = "gname";
pub const COL_KILL: &str = "nkill";
pub const COL_WOUND: &str = "nwound";
pub const COL_SUCCESS: &str = "success";
pub const COL_SUICIDE: &str = "suicide";
pub const COL_DATE: &str = "Date";

/// Source columns the loader keeps; everything else is projected away.
pub const EXPECTED_COLUMNS: [&str; 19] = [
    COL_EVENT_ID,
    COL_YEAR,
    COL_MONTH,
    COL_DAY,
    COL_COUNTRY,
    COL_REGION,
    COL_PROVSTATE,
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
    COL_DATE,
];

pub fn is_expected_column(name: &str) -> bool {
    EXPECTED_COLUMNS.contains(&name)
}

// ---------------------------------------------------------------------------
// CellValue – a single raw cell before normalization
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from CSV, JSON or Parquet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell. Strings are parsed; booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            CellValue::Null => None,
        }
    }

    /// Integer view; integral floats such as `2001.0` are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        if let CellValue::Integer(i) = self {
            return Some(*i);
        }
        self.as_f64()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    }

    /// Non-empty text view. Numbers are rendered, nulls and blanks are `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.trim().is_empty() => None,
            CellValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// One raw row projected onto [`EXPECTED_COLUMNS`].
pub type RawRow = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// EventRecord – one normalized incident
// ---------------------------------------------------------------------------

/// A single incident after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_id: Option<i64>,
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    /// Parsed from `Date` or rebuilt from year/month/day; `None` if unparsable.
    pub event_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub provstate: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub attack_type: Option<String>,
    pub target_type: Option<String>,
    pub weapon_type: Option<String>,
    pub group: Option<String>,
    /// Always finite and `>= 0`.
    pub kill: f64,
    /// Always finite and `>= 0`.
    pub wound: f64,
    pub success: Option<i64>,
    pub suicide: Option<i64>,
}

impl EventRecord {
    /// Kill count plus wound count.
    pub fn casualties(&self) -> f64 {
        self.kill + self.wound
    }
}

// ---------------------------------------------------------------------------
// EventTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Categorical columns that drive the multi-select pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Region,
    Country,
    AttackType,
    TargetType,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Region,
        Category::Country,
        Category::AttackType,
        Category::TargetType,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Region => "Region",
            Category::Country => "Country",
            Category::AttackType => "Attack Type",
            Category::TargetType => "Target Type",
        }
    }

    pub fn value_of(self, record: &EventRecord) -> Option<&str> {
        match self {
            Category::Region => record.region.as_deref(),
            Category::Country => record.country.as_deref(),
            Category::AttackType => record.attack_type.as_deref(),
            Category::TargetType => record.target_type.as_deref(),
        }
    }
}

/// The full normalized dataset with pre-computed picker values.
///
/// Rows are never mutated after construction; filtering yields
/// [`EventView`](super::filter::EventView)s over the same table.
#[derive(Debug, Clone)]
pub struct EventTable {
    records: Vec<EventRecord>,
    /// Whitelisted columns that were present in the source, in whitelist order.
    columns: Vec<String>,
    /// For each picker column the sorted set of distinct values.
    unique_values: BTreeMap<Category, BTreeSet<String>>,
}

impl EventTable {
    /// Build column indices from normalized records.
    pub fn new(records: Vec<EventRecord>, columns: Vec<String>) -> Self {
        let mut unique_values: BTreeMap<Category, BTreeSet<String>> = Category::ALL
            .iter()
            .map(|c| (*c, BTreeSet::new()))
            .collect();

        for rec in &records {
            for cat in Category::ALL {
                if let Some(v) = cat.value_of(rec) {
                    unique_values
                        .entry(cat)
                        .or_default()
                        .insert(v.to_string());
                }
            }
        }

        EventTable {
            records,
            columns,
            unique_values,
        }
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Sorted distinct values of a picker column (empty if the column is absent).
    pub fn unique_values(&self, category: Category) -> impl Iterator<Item = &str> {
        self.unique_values
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Earliest and latest known event date.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(|r| r.event_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Upper bound for the casualty slider: max kills plus max wounds.
    pub fn casualty_ceiling(&self) -> f64 {
        let max_kill = self.records.iter().map(|r| r.kill).fold(0.0, f64::max);
        let max_wound = self.records.iter().map(|r| r.wound).fold(0.0, f64::max);
        max_kill + max_wound
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_value_coercions() {
        assert_eq!(CellValue::String(" 12 ".into()).as_f64(), Some(12.0));
        assert_eq!(CellValue::String("n/a".into()).as_f64(), None);
        assert_eq!(CellValue::Float(2001.0).as_i64(), Some(2001));
        assert_eq!(CellValue::Float(2001.5).as_i64(), None);
        assert_eq!(CellValue::String("".into()).as_text(), None);
        assert_eq!(CellValue::Integer(7).as_text().as_deref(), Some("7"));
    }

    #[test]
    fn whitelist_membership() {
        assert!(is_expected_column("nkill"));
        assert!(is_expected_column("Date"));
        assert!(!is_expected_column("summary"));
    }
}
