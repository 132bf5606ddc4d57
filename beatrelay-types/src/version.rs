//! Fixed literals of the metricbeat document layout.

/// Mapping type every document is indexed under.
pub const RECORD_TYPE: &str = "doc";

/// Metricbeat module name documents are filed under.
///
/// Also the key of the payload object inside `_source`.
pub const MODULE_TAG: &str = "secretservice";

/// Beat version reported in the `beat` block of every document.
///
/// Index templates on the storage side are keyed on this version.
pub const BEAT_VERSION: &str = "6.2.4";
