//! # beatrelay-types
//!
//! Core types for relaying a dropwizard metrics snapshot into a search store.
//!
//! A [`Snapshot`] is one reading of a metrics endpoint: a passthrough
//! `version` plus five metric sets (gauges, counters, histograms, meters,
//! timers). Each of the six [`Category`] values becomes one [`Document`] in
//! the metricbeat-compatible layout Elasticsearch dashboards expect.
//!
//! ## Example
//!
//! ```rust
//! use beatrelay_types::{Category, IndexTemplate, Snapshot};
//! use chrono::NaiveDate;
//! use serde_json::json;
//!
//! let snapshot = Snapshot::builder()
//!     .version(json!("1.2.3"))
//!     .gauge("jvm.heap.used", json!({ "value": 1024 }))
//!     .build();
//!
//! assert_eq!(snapshot.payload(Category::Version), json!("1.2.3"));
//!
//! let template = IndexTemplate::parse("metrics-%s").unwrap();
//! let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
//! assert_eq!(template.resolve(date), "metrics-2024.03.05");
//! ```

mod document;
mod snapshot;
mod template;
mod version;

pub use document::*;
pub use snapshot::*;
pub use template::*;
pub use version::*;
