//! Snapshot to documents.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use beatrelay_types::{format_timestamp, Category, Document, IndexTemplate, Origin, Snapshot};

use crate::hostname::HostnameCache;

/// The documents of one cycle, all bound for the same index.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Index every document targets.
    pub index: String,
    /// Creation instant shared by every document.
    pub timestamp: String,
    /// One document per category, in [`Category::ALL`] order.
    pub documents: Vec<Document>,
}

impl Batch {
    /// The document of one category.
    pub fn document(&self, category: Category) -> Option<&Document> {
        self.documents.iter().find(|d| d.category() == category)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Turns snapshots into batches of documents.
///
/// Apart from the first hostname lookup this does no I/O, and it never fails.
#[derive(Debug, Clone)]
pub struct Transformer {
    template: IndexTemplate,
    hostname: Arc<HostnameCache>,
}

impl Transformer {
    pub fn new(template: IndexTemplate, hostname: Arc<HostnameCache>) -> Self {
        Self { template, hostname }
    }

    pub fn template(&self) -> &IndexTemplate {
        &self.template
    }

    /// Transform at the current instant.
    pub fn transform(&self, snapshot: &Snapshot) -> Batch {
        self.transform_at(snapshot, Utc::now())
    }

    /// Transform as of `now`. The index name uses the UTC date of `now`.
    pub fn transform_at(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Batch {
        let index = self.template.resolve_at(now);
        let timestamp = format_timestamp(now);
        let origin = Origin::for_host(self.hostname.get());

        let documents = Category::ALL
            .iter()
            .map(|&category| {
                Document::from_snapshot(
                    snapshot,
                    category,
                    index.clone(),
                    timestamp.clone(),
                    origin.clone(),
                )
            })
            .collect();

        Batch {
            index,
            timestamp,
            documents,
        }
    }
}
