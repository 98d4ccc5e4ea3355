//! Label-indexed entity lookup with containment collapsing.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Entity, EntityLabel};
use crate::text::normalize_phrase;

/// Ordered, deduplicated surface forms grouped by label, built once per
/// article and read-only afterward.
///
/// Containment collapse: when one entity's normalized form is a strict
/// substring of another's, only the longer form survives, and the pruning is
/// applied consistently across every label's list. The collapse runs in two
/// passes (collect forms, compute the keep-set, then build the index) so the
/// result does not depend on mutation order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct EntityIndex {
    by_label: BTreeMap<EntityLabel, Vec<String>>,
}

impl EntityIndex {
    pub fn build(entities: &[Entity]) -> Self {
        let normals: Vec<String> = entities
            .iter()
            .map(|e| normalize_phrase(&e.surface))
            .collect();

        // A form survives unless it is strictly contained in some other form.
        let kept: Vec<bool> = normals
            .iter()
            .map(|n| {
                !n.is_empty()
                    && !normals
                        .iter()
                        .any(|other| other != n && other.contains(n.as_str()))
            })
            .collect();

        let mut by_label: BTreeMap<EntityLabel, Vec<String>> = BTreeMap::new();
        for (i, entity) in entities.iter().enumerate() {
            if !kept[i] {
                continue;
            }
            let list = by_label.entry(entity.label).or_default();
            let duplicate = list
                .iter()
                .any(|existing| normalize_phrase(existing) == normals[i]);
            if !duplicate {
                list.push(entity.surface.clone());
            }
        }

        Self { by_label }
    }

    pub fn get(&self, label: EntityLabel) -> &[String] {
        self.by_label.get(&label).map_or(&[], Vec::as_slice)
    }

    /// First (most prominent) surface form for a label, if any.
    pub fn first(&self, label: EntityLabel) -> Option<&str> {
        self.get(label).first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityLabel, &[String])> {
        self.by_label.iter().map(|(l, v)| (*l, v.as_slice()))
    }
}
