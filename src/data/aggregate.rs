//! Projections derived from a filtered [`EventView`].
//!
//! Every function here is total: an empty view yields zero counters,
//! empty sequences or zero-filled grids, never an error. Where grouping
//! needs a tie-break the first-seen order of the view wins.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::filter::EventView;

/// Shown instead of a region name when no region can be ranked.
pub const NOT_AVAILABLE: &str = "N/A";

/// Number of groups kept by the ranking chart unless configured otherwise.
pub const DEFAULT_TOP_GROUPS: usize = 20;

// ---------------------------------------------------------------------------
// Summary counters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub attacks: usize,
    pub fatalities: f64,
    pub wounded: f64,
    pub deadliest_region: String,
}

pub fn summary(view: &EventView<'_>) -> Summary {
    let mut totals: Vec<(&str, f64)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for rec in view.iter() {
        let Some(region) = rec.region.as_deref() else {
            continue;
        };
        let i = *slot.entry(region).or_insert_with(|| {
            totals.push((region, 0.0));
            totals.len() - 1
        });
        totals[i].1 += rec.kill;
    }

    // Strict comparison keeps the earliest region on ties.
    let deadliest = totals
        .iter()
        .fold(None::<(&str, f64)>, |best, &(name, kills)| match best {
            Some((_, top)) if kills <= top => best,
            _ => Some((name, kills)),
        })
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Summary {
        attacks: view.len(),
        fatalities: view.iter().map(|r| r.kill).sum(),
        wounded: view.iter().map(|r| r.wound).sum(),
        deadliest_region: deadliest,
    }
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Monthly,
    #[default]
    Yearly,
    Decade,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Yearly, Granularity::Monthly, Granularity::Decade];

    pub fn label(self) -> &'static str {
        match self {
            Granularity::Monthly => "Monthly",
            Granularity::Yearly => "Yearly",
            Granularity::Decade => "Decade",
        }
    }
}

/// Grouping key for the trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBucket {
    /// First day of the month.
    Month(NaiveDate),
    Year(i32),
    /// `year - year mod 10`.
    Decade(i32),
}

impl TimeBucket {
    pub fn of(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Monthly => {
                TimeBucket::Month(date.with_day(1).unwrap_or(date))
            }
            Granularity::Yearly => TimeBucket::Year(date.year()),
            Granularity::Decade => TimeBucket::Decade(date.year() - date.year().rem_euclid(10)),
        }
    }

    /// Position on a continuous x axis, in fractional years.
    pub fn axis_value(&self) -> f64 {
        match self {
            TimeBucket::Month(d) => d.year() as f64 + d.month0() as f64 / 12.0,
            TimeBucket::Year(y) | TimeBucket::Decade(y) => *y as f64,
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBucket::Month(d) => write!(f, "{}", d.format("%Y-%m")),
            TimeBucket::Year(y) => write!(f, "{y}"),
            TimeBucket::Decade(y) => write!(f, "{y}s"),
        }
    }
}

/// Event counts per bucket, ascending. Empty buckets and undated rows are omitted.
pub fn time_series(view: &EventView<'_>, granularity: Granularity) -> Vec<(TimeBucket, usize)> {
    let mut counts: BTreeMap<TimeBucket, usize> = BTreeMap::new();
    for date in view.iter().filter_map(|r| r.event_date) {
        *counts.entry(TimeBucket::of(date, granularity)).or_default() += 1;
    }
    counts.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Geo points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    AttackType,
    Casualty,
}

impl ColorMode {
    pub const ALL: [ColorMode; 2] = [ColorMode::AttackType, ColorMode::Casualty];

    pub fn label(self) -> &'static str {
        match self {
            ColorMode::AttackType => "Attack Type",
            ColorMode::Casualty => "Casualty",
        }
    }
}

/// What drives a marker's appearance.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoMarker {
    /// Kill + wound, used as marker size.
    Casualty(f64),
    /// Attack category, used as marker colour.
    AttackType(Option<String>),
}

/// Attributes shown when hovering a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub country: Option<String>,
    pub group: Option<String>,
    /// Only filled in casualty mode; the colour already shows it otherwise.
    pub attack_type: Option<String>,
    pub target_type: Option<String>,
    pub kill: f64,
    pub wound: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub marker: GeoMarker,
    pub hover: HoverInfo,
}

/// One point per row that has both coordinates.
pub fn geo_points(view: &EventView<'_>, mode: ColorMode) -> Vec<GeoPoint> {
    view.iter()
        .filter_map(|rec| {
            let (latitude, longitude) = (rec.latitude?, rec.longitude?);
            let (marker, attack_type, target_type) = match mode {
                ColorMode::Casualty => (
                    GeoMarker::Casualty(rec.casualties()),
                    rec.attack_type.clone(),
                    rec.target_type.clone(),
                ),
                ColorMode::AttackType => (GeoMarker::AttackType(rec.attack_type.clone()), None, None),
            };
            Some(GeoPoint {
                latitude,
                longitude,
                marker,
                hover: HoverInfo {
                    country: rec.country.clone(),
                    group: rec.group.clone(),
                    attack_type,
                    target_type,
                    kill: rec.kill,
                    wound: rec.wound,
                },
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Top groups
// ---------------------------------------------------------------------------

/// Counts first-seen keys while keeping their encounter order.
fn count_in_order<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut slot: HashMap<&'a str, usize> = HashMap::new();
    for key in keys {
        let i = *slot.entry(key).or_insert_with(|| {
            counts.push((key.to_string(), 0));
            counts.len() - 1
        });
        counts[i].1 += 1;
    }
    counts
}

/// Events per perpetrator group, most active first, at most `limit` entries.
/// Equal counts keep first-seen order.
pub fn top_groups(view: &EventView<'_>, limit: usize) -> Vec<(String, usize)> {
    let mut counts = count_in_order(view.iter().filter_map(|r| r.group.as_deref()));
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

// ---------------------------------------------------------------------------
// Casualty distribution
// ---------------------------------------------------------------------------

/// Every `(attack type, kills)` pair in view order.
pub fn casualty_distribution(view: &EventView<'_>) -> Vec<(String, f64)> {
    view.iter()
        .filter_map(|r| Some((r.attack_type.clone()?, r.kill)))
        .collect()
}

/// Five-number summary of kills for one attack type.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub category: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Per-category summaries in first-seen category order.
pub fn box_summaries(distribution: &[(String, f64)]) -> Vec<BoxSummary> {
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for (cat, kills) in distribution {
        let i = *slot.entry(cat.as_str()).or_insert_with(|| {
            groups.push((cat.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(*kills);
    }

    groups
        .into_iter()
        .map(|(cat, mut values)| {
            values.sort_by(f64::total_cmp);
            BoxSummary {
                category: cat.to_string(),
                count: values.len(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            }
        })
        .collect()
}

/// Linear-interpolated quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ---------------------------------------------------------------------------
// Cross-tabulation
// ---------------------------------------------------------------------------

/// Target type (rows) by weapon type (columns) co-occurrence counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossTab {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `counts[row][col]`, zero where nothing was observed.
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Rows lacking either label are not counted. Labels are sorted.
pub fn cross_tab(view: &EventView<'_>) -> CrossTab {
    let pairs: Vec<(&str, &str)> = view
        .iter()
        .filter_map(|r| Some((r.target_type.as_deref()?, r.weapon_type.as_deref()?)))
        .collect();

    let rows: BTreeSet<&str> = pairs.iter().map(|(t, _)| *t).collect();
    let cols: BTreeSet<&str> = pairs.iter().map(|(_, w)| *w).collect();
    let row_index: HashMap<&str, usize> = rows.iter().enumerate().map(|(i, r)| (*r, i)).collect();
    let col_index: HashMap<&str, usize> = cols.iter().enumerate().map(|(i, c)| (*c, i)).collect();

    let mut counts = vec![vec![0usize; cols.len()]; rows.len()];
    for (target, weapon) in &pairs {
        counts[row_index[target]][col_index[weapon]] += 1;
    }

    CrossTab {
        row_labels: rows.into_iter().map(str::to_string).collect(),
        col_labels: cols.into_iter().map(str::to_string).collect(),
        counts,
    }
}

// ---------------------------------------------------------------------------
// Seasonal histogram
// ---------------------------------------------------------------------------

/// Events per calendar month, index 0 = January. Undated rows are skipped.
pub fn seasonal(view: &EventView<'_>) -> [usize; 12] {
    let mut months = [0usize; 12];
    for date in view.iter().filter_map(|r| r.event_date) {
        months[date.month0() as usize] += 1;
    }
    months
}

// ---------------------------------------------------------------------------
// Dashboard – every projection for one render cycle
// ---------------------------------------------------------------------------

/// All chart inputs for the current filter state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summary: Summary,
    pub trend: Vec<(TimeBucket, usize)>,
    pub geo: Vec<GeoPoint>,
    pub top_groups: Vec<(String, usize)>,
    pub distribution: Vec<(String, f64)>,
    pub boxes: Vec<BoxSummary>,
    pub cross_tab: CrossTab,
    pub seasonal: [usize; 12],
}

impl Dashboard {
    pub fn compute(
        view: &EventView<'_>,
        granularity: Granularity,
        color_mode: ColorMode,
        top_n: usize,
    ) -> Self {
        let distribution = casualty_distribution(view);
        let boxes = box_summaries(&distribution);
        Dashboard {
            summary: summary(view),
            trend: time_series(view, granularity),
            geo: geo_points(view, color_mode),
            top_groups: top_groups(view, top_n),
            distribution,
            boxes,
            cross_tab: cross_tab(view),
            seasonal: seasonal(view),
        }
    }
}
