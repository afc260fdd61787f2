//! Data layer: cell values, tables, loading and arrow interop.
//!
//! Architecture:
//! ```text
//!  .csv / .xlsx / .json / .parquet      caller's Table
//!        │                                   │
//!        ▼                                   ▼
//!   ┌──────────┐                       ┌──────────┐
//!   │  loader   │  parse file          │  loader   │  clone
//!   └──────────┘                       └──────────┘
//!        │                                   │
//!        └──────────────┬────────────────────┘
//!                       ▼
//!                ┌─────────────┐
//!                │    Table     │  ordered, named Vec<Value> columns
//!                └─────────────┘
//!                       │
//!                       ▼
//!                ┌─────────────┐
//!                │    batch     │  RecordBatch conversion, pretty print
//!                └─────────────┘
//! ```

pub mod batch;
pub mod loader;
pub mod model;
