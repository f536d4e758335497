//! Multi-source view composition
//!
//! Builds one composed view model from several independent remote
//! collections:
//! - All source fetches are issued as a single concurrent batch
//! - A failed required source aborts the whole view with one error
//! - A failed best-effort source degrades to an empty collection
//! - The primary collection can be enriched per item by a secondary
//!   fan-out, with each item's failure isolated from its siblings
//!
//! The composer holds no state between invocations; every call is
//! independent and idempotent given the same remote responses. Callers that
//! abandon interest simply drop the returned future — there is no
//! cancellation of in-flight fetches here.

use std::collections::BTreeMap;

use futures::future::{LocalBoxFuture, join_all};
use serde_json::Value;

use crate::error::{DashboardError, Result};
use crate::types::Record;

/// Outcome of one source call: a collection, or an opaque failure reason
pub type FetchResult = std::result::Result<Vec<Record>, String>;

/// A boxed source fetch. Futures are not `Send`: the Workers runtime is
/// single-threaded and the batch is cooperative, not parallel.
pub type SourceFuture = LocalBoxFuture<'static, FetchResult>;

/// Outcome of one enrichment call: extra fields for an item, or a reason
pub type EnrichResult = std::result::Result<Record, String>;

/// A boxed per-item enrichment fetch
pub type EnrichFuture = LocalBoxFuture<'static, EnrichResult>;

/// Failure policy of a source fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePolicy {
    /// Failure invalidates the entire composed view
    Required,
    /// Failure degrades to an empty collection
    BestEffort,
}

/// One declared source fetch of a composed view
pub struct Source {
    name: String,
    policy: SourcePolicy,
    fetch: SourceFuture,
}

impl Source {
    /// Declare a source whose failure aborts the composition
    pub fn required(name: impl Into<String>, fetch: SourceFuture) -> Self {
        Self {
            name: name.into(),
            policy: SourcePolicy::Required,
            fetch,
        }
    }

    /// Declare a source whose failure yields an empty collection
    pub fn best_effort(name: impl Into<String>, fetch: SourceFuture) -> Self {
        Self {
            name: name.into(),
            policy: SourcePolicy::BestEffort,
            fetch,
        }
    }
}

/// Per-item enrichment of the primary collection.
///
/// The fetch closure is invoked once per primary item; successful results
/// are matched back by the identifier field and merged into every item
/// sharing that identifier. Enrichment values win on key collision.
pub struct Enrichment {
    key: String,
    fetch: Box<dyn Fn(&Record) -> EnrichFuture>,
}

impl Enrichment {
    /// Create an enrichment keyed by the given identifier field
    pub fn new(key: impl Into<String>, fetch: impl Fn(&Record) -> EnrichFuture + 'static) -> Self {
        Self {
            key: key.into(),
            fetch: Box::new(fetch),
        }
    }

    /// Enrich every item of a collection, isolating per-item failures.
    ///
    /// A failed call leaves that item's base fields intact and does not
    /// affect any sibling's outcome.
    async fn apply(&self, items: Vec<Record>) -> Vec<Record> {
        let calls: Vec<EnrichFuture> = items.iter().map(|item| (self.fetch)(item)).collect();
        let outcomes = join_all(calls).await;

        // First successful result per identifier; duplicates within the
        // primary collection all receive it.
        let mut by_id: Vec<(Value, &Record)> = Vec::new();
        for (item, outcome) in items.iter().zip(&outcomes) {
            if let (Some(id), Ok(fields)) = (item.get(&self.key), outcome) {
                if !by_id.iter().any(|(seen, _)| seen == id) {
                    by_id.push((id.clone(), fields));
                }
            }
        }

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let fields = match item.get(&self.key) {
                    Some(id) => by_id.iter().find(|(seen, _)| seen == id).map(|(_, f)| *f),
                    // No identifier to match on: fall back to this item's own call
                    None => outcomes[index].as_ref().ok(),
                };

                let mut merged = item.clone();
                if let Some(fields) = fields {
                    for (key, value) in fields {
                        merged.insert(key.clone(), value.clone());
                    }
                }
                merged
            })
            .collect()
    }
}

/// A composed view model: the enriched primary collection plus every
/// secondary collection, keyed by source name
#[derive(Debug, Default)]
pub struct ComposedView {
    /// Primary items, order preserved from the primary fetch
    pub primary: Vec<Record>,

    /// Secondary collections; a failed best-effort source appears as empty
    pub sections: BTreeMap<String, Vec<Record>>,
}

/// Compose a view from one primary source, any number of secondary sources
/// and an optional per-item enrichment.
///
/// All sources are fetched in a single concurrent batch. Enrichment calls
/// form a second batch, issued only once the primary collection is known;
/// an empty primary collection issues zero enrichment calls.
pub async fn compose(
    primary: Source,
    sources: Vec<Source>,
    enrichment: Option<Enrichment>,
) -> Result<ComposedView> {
    let mut declared = vec![(primary.name, primary.policy)];
    let mut fetches = vec![primary.fetch];
    for source in sources {
        declared.push((source.name, source.policy));
        fetches.push(source.fetch);
    }

    let outcomes = join_all(fetches).await;

    // A single aggregate error: the first failed required source in
    // declaration order, primary first.
    for ((name, policy), outcome) in declared.iter().zip(&outcomes) {
        if *policy == SourcePolicy::Required {
            if let Err(reason) = outcome {
                return Err(DashboardError::required_source(name, reason.clone()));
            }
        }
    }

    let mut outcomes = outcomes.into_iter();
    let primary_items = outcomes.next().unwrap_or(Ok(Vec::new())).unwrap_or_default();

    let mut sections = BTreeMap::new();
    for ((name, _), outcome) in declared.into_iter().skip(1).zip(outcomes) {
        sections.insert(name, outcome.unwrap_or_default());
    }

    let primary = match enrichment {
        Some(enrichment) if !primary_items.is_empty() => enrichment.apply(primary_items).await,
        _ => primary_items,
    };

    Ok(ComposedView { primary, sections })
}
