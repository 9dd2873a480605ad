//! End-to-end checks of the load → filter → aggregate pipeline.
//!
//!   1. Fallback          -- unreadable sources yield the sample and a warning
//!   2. Normalization     -- counts never negative, dates rebuilt or nulled
//!   3. Filtering         -- pass-through, idempotence, casualty bounds
//!   4. Aggregation       -- seasonal and cross-tab totals, empty results

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use darkpulse::cache::DatasetCache;
use darkpulse::data::aggregate::{
    ColorMode, DEFAULT_TOP_GROUPS, Dashboard, Granularity, NOT_AVAILABLE, cross_tab, seasonal,
    summary,
};
use darkpulse::data::filter::{FilterCriteria, apply_filters};
use darkpulse::data::loader::{LoadOptions, Source, load, try_load};
use darkpulse::data::model::EventTable;
use darkpulse::data::sample::sample_table;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MESSY_CSV: &str = "\
eventid,iyear,imonth,iday,country_txt,region_txt,attacktype1_txt,targtype1_txt,weaptype1_txt,gname,nkill,nwound,success,suicide,extra
1,1998,0,0,Peru,South America,Bombing/Explosion,Police,Explosives,Shining Path (SL),3,,1,0,x
2,1998,2,30,Peru,South America,Armed Assault,Police,Firearms,Shining Path (SL),-2,4,1,0,x
3,2004,11,2,Iraq,Middle East & North Africa,Bombing/Explosion,Military,Explosives,Unknown,abc,12,0,1,x
4,2004,11,3,Iraq,Middle East & North Africa,Armed Assault,Military,Firearms,Unknown,7.0,1.5,1,0,x
";

fn write_csv(dir: &Path, name: &str, body: &str) -> Source {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    Source::Local(path)
}

fn load_messy() -> (TempDir, EventTable) {
    let dir = TempDir::new().unwrap();
    let source = write_csv(dir.path(), "messy.csv", MESSY_CSV);
    let table = try_load(&source, &LoadOptions::default()).unwrap();
    (dir, table)
}

// ---------------------------------------------------------------------------
// 1. Fallback
// ---------------------------------------------------------------------------

#[test]
fn unreadable_source_yields_sample_with_warning() {
    let dir = TempDir::new().unwrap();
    let missing = Source::Local(dir.path().join("absent.csv"));

    let outcome = load(&missing, &LoadOptions::default());
    assert_eq!(outcome.table.len(), 5);
    assert!(outcome.warning.unwrap().contains("sample"));
}

#[test]
fn malformed_json_yields_sample() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"not\": \"an array\"}").unwrap();

    let outcome = load(&Source::Local(path), &LoadOptions::default());
    assert_eq!(outcome.table.records(), sample_table().records());
    assert!(outcome.warning.is_some());
}

#[test]
fn cache_reuses_loaded_file_until_invalidated() {
    let dir = TempDir::new().unwrap();
    let source = write_csv(dir.path(), "gtd.csv", MESSY_CSV);
    let mut cache = DatasetCache::new(LoadOptions::default());

    let first = cache.get_or_load(&source);
    assert_eq!(first.table.len(), 4);

    // Changing the file does not matter while the entry is cached.
    fs::write(dir.path().join("gtd.csv"), "eventid\n1\n").unwrap();
    assert_eq!(cache.get_or_load(&source).table.len(), 4);

    cache.invalidate(&source);
    assert_eq!(cache.get_or_load(&source).table.len(), 1);
}

// ---------------------------------------------------------------------------
// 2. Normalization
// ---------------------------------------------------------------------------

#[test]
fn counts_are_non_negative_after_normalization() {
    let (_dir, table) = load_messy();
    assert!(table.records().iter().all(|r| r.kill >= 0.0 && r.wound >= 0.0));

    let kills: Vec<f64> = table.records().iter().map(|r| r.kill).collect();
    let wounds: Vec<f64> = table.records().iter().map(|r| r.wound).collect();
    assert_eq!(kills, vec![3.0, 0.0, 0.0, 7.0]);
    assert_eq!(wounds, vec![0.0, 4.0, 12.0, 1.5]);
}

#[test]
fn dates_are_rebuilt_or_nulled() {
    let (_dir, table) = load_messy();
    let dates: Vec<Option<NaiveDate>> = table.records().iter().map(|r| r.event_date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(1998, 1, 1),
            None,
            NaiveDate::from_ymd_opt(2004, 11, 2),
            NaiveDate::from_ymd_opt(2004, 11, 3),
        ]
    );
    assert!(!table.has_column("extra"));
}

// ---------------------------------------------------------------------------
// 3. Filtering
// ---------------------------------------------------------------------------

#[test]
fn full_ranges_return_every_row_in_order() {
    let table = sample_table();
    let (lo, hi) = table.date_span().unwrap();
    let criteria = FilterCriteria {
        start_date: Some(lo),
        end_date: Some(hi),
        casualties: Some(0.0..=table.casualty_ceiling()),
        ..Default::default()
    };
    let view = apply_filters(&table, &criteria);
    assert_eq!(view.indices(), &[0, 1, 2, 3, 4]);
}

#[test]
fn filtering_is_idempotent() {
    let (_dir, table) = load_messy();
    let mut criteria = FilterCriteria {
        start_date: NaiveDate::from_ymd_opt(1990, 1, 1),
        casualties: Some(0.0..=10.0),
        ..Default::default()
    };
    criteria.success.insert(1);

    let once = apply_filters(&table, &criteria);
    let twice = once.refine(&criteria);
    assert_eq!(once.indices(), twice.indices());
    assert_eq!(once.indices(), &[0, 3]);
}

#[test]
fn casualty_bounds_on_the_deadliest_sample_row() {
    let table = sample_table();
    let pass = FilterCriteria {
        casualties: Some(0.0..=10000.0),
        ..Default::default()
    };
    let fail = FilterCriteria {
        casualties: Some(0.0..=100.0),
        ..Default::default()
    };
    assert!(apply_filters(&table, &pass).iter().any(|r| r.kill == 3000.0));
    assert!(!apply_filters(&table, &fail).iter().any(|r| r.kill == 3000.0));
}

#[test]
fn initial_criteria_keep_rows_without_flag_columns() {
    let dir = TempDir::new().unwrap();
    let source = write_csv(
        dir.path(),
        "no_flags.csv",
        "eventid,iyear,imonth,iday,region_txt,nkill,nwound\n\
         1,2001,5,4,South Asia,2,1\n\
         2,2003,8,19,Western Europe,0,3\n",
    );
    let table = try_load(&source, &LoadOptions::default()).unwrap();
    assert_eq!(table.len(), 2);

    let criteria = FilterCriteria::initial(&table, 1000.0, &[1, 0], &[1, 0]);
    assert_eq!(apply_filters(&table, &criteria).indices(), &[0, 1]);

    // Even a narrowed flag default cannot apply to a column that is absent.
    let narrowed = FilterCriteria::initial(&table, 1000.0, &[1], &[0]);
    assert_eq!(apply_filters(&table, &narrowed).len(), 2);
}

#[test]
fn middle_east_scenario() {
    let table = sample_table();
    let mut criteria = FilterCriteria::default();
    criteria
        .regions
        .insert("Middle East & North Africa".to_string());

    let view = apply_filters(&table, &criteria);
    let s = summary(&view);
    assert_eq!(s.attacks, 2);
    assert_eq!(s.fatalities, 650.0);
    let countries: Vec<_> = view.iter().filter_map(|r| r.country.clone()).collect();
    assert_eq!(countries, vec!["Iraq", "Syria"]);
}

// ---------------------------------------------------------------------------
// 4. Aggregation
// ---------------------------------------------------------------------------

#[test]
fn seasonal_and_cross_tab_totals() {
    let (_dir, table) = load_messy();
    let view = apply_filters(&table, &FilterCriteria::default());

    let months = seasonal(&view);
    assert_eq!(months.len(), 12);
    // One row has no valid date.
    assert_eq!(months.iter().sum::<usize>(), view.len() - 1);
    assert_eq!(months[10], 2);

    let tab = cross_tab(&view);
    assert_eq!(tab.total(), view.len());
}

#[test]
fn empty_selection_degrades_to_sentinels() {
    let table = sample_table();
    let criteria = FilterCriteria {
        start_date: NaiveDate::from_ymd_opt(2030, 1, 1),
        end_date: NaiveDate::from_ymd_opt(2000, 1, 1),
        ..Default::default()
    };
    let view = apply_filters(&table, &criteria);
    assert!(view.is_empty());

    let dash = Dashboard::compute(&view, Granularity::Monthly, ColorMode::Casualty, DEFAULT_TOP_GROUPS);
    assert_eq!(dash.summary.attacks, 0);
    assert_eq!(dash.summary.fatalities, 0.0);
    assert_eq!(dash.summary.wounded, 0.0);
    assert_eq!(dash.summary.deadliest_region, NOT_AVAILABLE);
    assert!(dash.trend.is_empty());
    assert!(dash.geo.is_empty());
    assert!(dash.top_groups.is_empty());
    assert!(dash.distribution.is_empty());
    assert!(dash.boxes.is_empty());
    assert_eq!(dash.cross_tab.total(), 0);
    assert_eq!(dash.seasonal, [0; 12]);
}
