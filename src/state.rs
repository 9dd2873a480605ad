use std::collections::BTreeSet;
use std::sync::Arc;

use darkpulse::cache::{CachedTable, DatasetCache};
use darkpulse::config::Settings;
use darkpulse::data::aggregate::{ColorMode, Dashboard, Granularity};
use darkpulse::data::filter::{FilterCriteria, apply_filters, covers_both_flags};
use darkpulse::data::loader::Source;
use darkpulse::data::model::{Category, EventTable};

use crate::color::CategoryColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    cache: DatasetCache,

    /// Source the current table came from.
    pub source: Source,

    /// Loaded table (None until the first load finishes).
    pub table: Option<Arc<EventTable>>,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Trend chart grouping.
    pub granularity: Granularity,

    /// Map marker mode.
    pub color_mode: ColorMode,

    /// Indices of events passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Chart inputs for `visible_indices`.
    pub dashboard: Option<Dashboard>,

    /// Colour per attack type, shared by the map and the box plot.
    pub attack_colors: Option<CategoryColors>,

    /// Load warning / error shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            cache: DatasetCache::new(settings.load_options()),
            source: settings.source(),
            granularity: settings.granularity,
            color_mode: settings.color_by,
            settings,
            table: None,
            criteria: FilterCriteria::default(),
            visible_indices: Vec::new(),
            dashboard: None,
            attack_colors: None,
            status_message: None,
        }
    }

    /// Load (or reuse) the table for `source` and make it current.
    pub fn open_source(&mut self, source: Source) {
        let cached = self.cache.get_or_load(&source);
        self.source = source;
        self.set_table(cached);
    }

    /// Drop the cached copy of the current source and fetch it again.
    pub fn reload(&mut self) {
        self.cache.invalidate(&self.source);
        self.open_source(self.source.clone());
    }

    /// Ingest a loaded table, initialise filters and colours.
    fn set_table(&mut self, cached: CachedTable) {
        let CachedTable { table, warning } = cached;

        self.criteria = self.default_criteria(&table);
        self.attack_colors = Some(CategoryColors::new(
            table.unique_values(Category::AttackType),
        ));
        self.status_message = warning;
        self.table = Some(table);
        self.refilter();
    }

    /// Initial control values: the table's full date span, the configured
    /// casualty ceiling and flag selections, no categorical restriction.
    fn default_criteria(&self, table: &EventTable) -> FilterCriteria {
        FilterCriteria::initial(
            table,
            self.settings.default_casualty_max,
            &self.settings.default_success,
            &self.settings.default_suicide,
        )
    }

    /// Restore the initial filter values for the current table.
    pub fn reset_filters(&mut self) {
        if let Some(table) = self.table.clone() {
            self.criteria = self.default_criteria(&table);
            self.refilter();
        }
    }

    /// Recompute `visible_indices` and every projection after a change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let view = apply_filters(table, &self.criteria);
        log::debug!("{} of {} events pass the filters", view.len(), table.len());

        self.dashboard = Some(Dashboard::compute(
            &view,
            self.granularity,
            self.color_mode,
            self.settings.top_groups,
        ));
        self.visible_indices = view.indices().to_vec();
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        if self.granularity != granularity {
            self.granularity = granularity;
            self.refilter();
        }
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        if self.color_mode != mode {
            self.color_mode = mode;
            self.refilter();
        }
    }

    /// Toggle a single value in a picker's allow-set.
    pub fn toggle_category(&mut self, category: Category, value: &str) {
        let selected = self.criteria.allow_set_mut(category);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Empty a picker's allow-set, which lifts that restriction.
    pub fn clear_category(&mut self, category: Category) {
        self.criteria.allow_set_mut(category).clear();
        self.refilter();
    }

    /// Toggle one value of the success or suicide flag selection. An empty
    /// selection means both values are checked.
    pub fn toggle_flag(&mut self, flag: Flag, value: i64) {
        let selected: &mut BTreeSet<i64> = match flag {
            Flag::Success => &mut self.criteria.success,
            Flag::Suicide => &mut self.criteria.suicide,
        };
        if selected.is_empty() {
            // Unrestricted: unchecking one value keeps only the other.
            selected.extend([0, 1].into_iter().filter(|v| *v != value));
        } else if !selected.remove(&value) {
            selected.insert(value);
        }
        if covers_both_flags(selected) {
            selected.clear();
        }
        self.refilter();
    }
}

/// Boolean-as-integer columns with their own picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Success,
    Suicide,
}

impl Flag {
    pub fn label(self) -> &'static str {
        match self {
            Flag::Success => "Attack Success",
            Flag::Suicide => "Suicide Attack",
        }
    }
}
