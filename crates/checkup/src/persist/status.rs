use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::result::CheckResult;

type Groups = BTreeMap<String, Vec<CheckResult>>;
type Products = BTreeMap<String, Groups>;

/// Latest result per host, product and group.
///
/// Serialises as `{host: {product: {group: [result]}}}`. Every slot holds
/// exactly one result; a newer one replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusStore {
    hosts: BTreeMap<String, Products>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `result` under its host, product and group, replacing any
    /// previous entry regardless of its date.
    pub fn record(&mut self, result: CheckResult) {
        let slot = self
            .hosts
            .entry(result.host.clone())
            .or_default()
            .entry(result.product.clone())
            .or_default()
            .entry(result.group.clone())
            .or_default();
        slot.clear();
        slot.push(result);
    }

    pub fn latest(&self, host: &str, product: &str, group: &str) -> Option<&CheckResult> {
        self.hosts.get(host)?.get(product)?.get(group)?.first()
    }

    /// Number of stored (host, product, group) entries.
    pub fn len(&self) -> usize {
        self.hosts
            .values()
            .flat_map(BTreeMap::values)
            .map(|groups| groups.values().filter(|slot| !slot.is_empty()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
