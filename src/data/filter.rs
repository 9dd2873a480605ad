use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::NaiveDate;

use super::model::{COL_SUCCESS, COL_SUICIDE, Category, EventRecord, EventTable};

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Selected filter values. An empty allow-set or a `None` bound means
/// "no restriction" on that dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive lower bound on the event date.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the event date.
    pub end_date: Option<NaiveDate>,
    pub regions: BTreeSet<String>,
    pub countries: BTreeSet<String>,
    pub attack_types: BTreeSet<String>,
    pub target_types: BTreeSet<String>,
    /// Inclusive range on kill + wound.
    pub casualties: Option<RangeInclusive<f64>>,
    pub success: BTreeSet<i64>,
    pub suicide: BTreeSet<i64>,
}

impl FilterCriteria {
    /// Starting selections for a freshly loaded table: its full date span,
    /// casualties up to `casualty_max` (capped at the table's ceiling) and the
    /// given flag values.
    pub fn initial(
        table: &EventTable,
        casualty_max: f64,
        success: &[i64],
        suicide: &[i64],
    ) -> Self {
        let (start_date, end_date) = match table.date_span() {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (None, None),
        };
        FilterCriteria {
            start_date,
            end_date,
            casualties: Some(0.0..=casualty_max.min(table.casualty_ceiling())),
            success: flag_selection(table, COL_SUCCESS, success),
            suicide: flag_selection(table, COL_SUICIDE, suicide),
            ..Default::default()
        }
    }

    /// Allow-set for one of the picker columns.
    pub fn allow_set(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Region => &self.regions,
            Category::Country => &self.countries,
            Category::AttackType => &self.attack_types,
            Category::TargetType => &self.target_types,
        }
    }

    pub fn allow_set_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Region => &mut self.regions,
            Category::Country => &mut self.countries,
            Category::AttackType => &mut self.attack_types,
            Category::TargetType => &mut self.target_types,
        }
    }

    /// Whether a single record passes every active predicate.
    ///
    /// A record with no event date fails as soon as either date bound is set.
    /// A record missing a categorical value fails a non-empty allow-set.
    pub fn matches(&self, rec: &EventRecord) -> bool {
        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(date) = rec.event_date else {
                return false;
            };
            if self.start_date.is_some_and(|start| date < start) {
                return false;
            }
            if self.end_date.is_some_and(|end| date > end) {
                return false;
            }
        }

        for cat in Category::ALL {
            let allowed = self.allow_set(cat);
            if allowed.is_empty() {
                continue;
            }
            match cat.value_of(rec) {
                Some(v) if allowed.contains(v) => {}
                _ => return false,
            }
        }

        if let Some(range) = &self.casualties {
            if !range.contains(&rec.casualties()) {
                return false;
            }
        }

        flag_allowed(&self.success, rec.success) && flag_allowed(&self.suicide, rec.suicide)
    }
}

/// Both flag values selected, or a flag column the table does not have,
/// restricts nothing and is stored as the empty set.
fn flag_selection(table: &EventTable, column: &str, selected: &[i64]) -> BTreeSet<i64> {
    let set: BTreeSet<i64> = selected.iter().copied().collect();
    if !table.has_column(column) || covers_both_flags(&set) {
        BTreeSet::new()
    } else {
        set
    }
}

/// Whether a flag selection holds both 0 and 1.
pub fn covers_both_flags(set: &BTreeSet<i64>) -> bool {
    set.contains(&0) && set.contains(&1)
}

fn flag_allowed(allowed: &BTreeSet<i64>, value: Option<i64>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.contains(&v))
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Rows of a table that passed a filter, in original relative order.
#[derive(Debug, Clone)]
pub struct EventView<'a> {
    table: &'a EventTable,
    indices: Vec<usize>,
}

impl<'a> EventView<'a> {
    /// A view over every row of `table`.
    pub fn all(table: &'a EventTable) -> Self {
        Self {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    /// A view over explicit row indices.
    pub fn from_indices(table: &'a EventTable, indices: Vec<usize>) -> Self {
        Self { table, indices }
    }

    /// Re-apply criteria on this view, keeping order.
    pub fn refine(&self, criteria: &FilterCriteria) -> EventView<'a> {
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| criteria.matches(&self.table.records()[i]))
            .collect();
        EventView {
            table: self.table,
            indices,
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a EventRecord> + '_ {
        let records = self.table.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn table(&self) -> &'a EventTable {
        self.table
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Return the rows of `table` that pass all active filters.
pub fn apply_filters<'a>(table: &'a EventTable, criteria: &FilterCriteria) -> EventView<'a> {
    EventView::all(table).refine(criteria)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::sample_table;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_criteria_is_pass_through() {
        let table = sample_table();
        let view = apply_filters(&table, &FilterCriteria::default());
        assert_eq!(view.indices(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn full_ranges_return_whole_table_in_order() {
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
    fn region_filter_selects_middle_east() {
        let table = sample_table();
        let mut criteria = FilterCriteria::default();
        criteria
            .regions
            .insert("Middle East & North Africa".to_string());

        let view = apply_filters(&table, &criteria);
        let countries: Vec<_> = view.iter().filter_map(|r| r.country.as_deref()).collect();
        assert_eq!(countries, vec!["Iraq", "Syria"]);
        assert_eq!(view.iter().map(|r| r.kill).sum::<f64>(), 650.0);
    }

    #[test]
    fn casualty_range_is_inclusive_on_kill_plus_wound() {
        let table = sample_table();
        let wide = FilterCriteria {
            casualties: Some(0.0..=10000.0),
            ..Default::default()
        };
        assert!(apply_filters(&table, &wide).indices().contains(&0));

        let narrow = FilterCriteria {
            casualties: Some(0.0..=100.0),
            ..Default::default()
        };
        let view = apply_filters(&table, &narrow);
        assert!(!view.indices().contains(&0));
        // India (42) and Nigeria (80) remain.
        assert_eq!(view.indices(), &[2, 4]);

        let exact = FilterCriteria {
            casualties: Some(42.0..=42.0),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &exact).indices(), &[2]);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let table = sample_table();
        let criteria = FilterCriteria {
            start_date: Some(ymd(2005, 6, 15)),
            end_date: Some(ymd(2015, 12, 20)),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &criteria).indices(), &[1, 2, 3]);
    }

    #[test]
    fn inverted_date_range_is_empty() {
        let table = sample_table();
        let criteria = FilterCriteria {
            start_date: Some(ymd(2020, 1, 1)),
            end_date: Some(ymd(2000, 1, 1)),
            ..Default::default()
        };
        assert!(apply_filters(&table, &criteria).is_empty());
    }

    #[test]
    fn undated_rows_fail_any_date_bound() {
        let mut records = sample_table().records().to_vec();
        records[2].event_date = None;
        let table = EventTable::new(records, Vec::new());

        assert_eq!(apply_filters(&table, &FilterCriteria::default()).len(), 5);

        let criteria = FilterCriteria {
            start_date: Some(ymd(1970, 1, 1)),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &criteria).indices(), &[0, 1, 3, 4]);
    }

    #[test]
    fn flags_and_categories_combine_conjunctively() {
        let table = sample_table();
        let mut criteria = FilterCriteria::default();
        criteria.attack_types.insert("Bombing/Explosion".to_string());
        criteria.target_types.insert("Civilians".to_string());
        criteria.countries.insert("India".to_string());
        criteria.countries.insert("Nigeria".to_string());
        criteria.success.insert(1);
        criteria.suicide.insert(0);
        assert_eq!(apply_filters(&table, &criteria).indices(), &[2, 4]);

        criteria.suicide = BTreeSet::from([1]);
        assert!(apply_filters(&table, &criteria).is_empty());
    }

    #[test]
    fn initial_criteria_keep_every_sample_row() {
        let table = sample_table();
        let criteria = FilterCriteria::initial(&table, 1000.0, &[1, 0], &[1, 0]);
        assert!(criteria.success.is_empty());
        assert!(criteria.suicide.is_empty());
        assert_eq!(criteria.casualties, Some(0.0..=1000.0));
        // Rows 0 and 3 carry more than 1000 casualties.
        assert_eq!(apply_filters(&table, &criteria).indices(), &[1, 2, 4]);
    }

    #[test]
    fn initial_single_flag_value_is_kept() {
        let table = sample_table();
        let criteria = FilterCriteria::initial(&table, 10_000.0, &[1], &[0, 1]);
        assert_eq!(criteria.success, BTreeSet::from([1]));
        assert!(criteria.suicide.is_empty());
        assert_eq!(apply_filters(&table, &criteria).len(), 5);
    }

    #[test]
    fn refining_with_same_criteria_is_idempotent() {
        let table = sample_table();
        let mut criteria = FilterCriteria {
            casualties: Some(0.0..=2000.0),
            ..Default::default()
        };
        criteria.attack_types.insert("Bombing/Explosion".to_string());

        let once = apply_filters(&table, &criteria);
        let twice = once.refine(&criteria);
        assert_eq!(once.indices(), twice.indices());
    }
}
