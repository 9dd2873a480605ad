/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  URL / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch + decode + project onto whitelist (sample on failure)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize │  coerce counts, build event dates → EventTable
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterCriteria → EventView (row indices)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  summary, trend, geo, ranking, box, cross-tab, seasonal
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod sample;
