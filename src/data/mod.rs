/// Data layer: core types, loading, grouping, and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<Record>
///   └──────────┘
///        │             ┌──────────────┐
///        ▼             │ ToleranceSet │  ΔL*, Δa*, Δb* ∈ [0.01, 1.0]
///   ┌──────────┐       └──────────────┘
///   │ grouping  │ ◄────────────┘   greedy first-fit → Vec<Group>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  summary rows + member rows → .csv pair / .json
///   └──────────┘
/// ```

pub mod export;
pub mod grouping;
pub mod loader;
pub mod model;
pub mod tolerance;
