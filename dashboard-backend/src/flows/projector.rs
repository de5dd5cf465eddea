//! Vote read model
//!
//! The contract exposes option labels and counts as two parallel arrays.
//! These helpers pair them up and derive the tally shown to clients.

use dashboard_types::{VoteOption, VoteTally};
use ethers::types::U256;
use parking_lot::Mutex;
use std::sync::Arc;

/// Pair labels with counts by position. Missing counts are 0 and counts
/// beyond u64 saturate.
pub fn project(labels: &[String], counts: &[U256]) -> Vec<VoteOption> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| VoteOption {
            label: label.clone(),
            count: counts.get(i).map(saturating_u64).unwrap_or(0),
        })
        .collect()
}

fn saturating_u64(value: &U256) -> u64 {
    if *value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}

pub fn total_votes(options: &[VoteOption]) -> u64 {
    options.iter().fold(0u64, |acc, o| acc.saturating_add(o.count))
}

/// Share of `total` in percent; 0 when nobody has voted
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

pub fn tally(options: &[VoteOption]) -> Vec<VoteTally> {
    let total = total_votes(options);
    options
        .iter()
        .map(|o| {
            let percentage = percentage(o.count, total);
            VoteTally {
                label: o.label.clone(),
                count: o.count,
                percentage,
                percentage_display: format!("{:.1}%", percentage),
            }
        })
        .collect()
}

struct CachedProjection {
    labels: Arc<Vec<String>>,
    counts: Arc<Vec<U256>>,
    options: Arc<Vec<VoteOption>>,
}

/// Memoized [`project`], keyed on the identity of the two snapshots.
///
/// Each contract read produces a fresh `Arc`, so a new read always
/// recomputes and repeated views of the same reads share one result.
#[derive(Default)]
pub struct VoteProjection {
    cached: Mutex<Option<CachedProjection>>,
}

impl VoteProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, labels: &Arc<Vec<String>>, counts: &Arc<Vec<U256>>) -> Arc<Vec<VoteOption>> {
        let mut cached = self.cached.lock();
        if let Some(c) = cached.as_ref() {
            if Arc::ptr_eq(&c.labels, labels) && Arc::ptr_eq(&c.counts, counts) {
                return c.options.clone();
            }
        }

        let options = Arc::new(project(labels, counts));
        *cached = Some(CachedProjection {
            labels: labels.clone(),
            counts: counts.clone(),
            options: options.clone(),
        });
        options
    }
}
