//! Lazy stat aggregation over everything a character is wearing and feeling
//!
//! Derived totals are read far more often than contributors change, so the
//! aggregate is cached behind a dirty flag. Every mutation of a contributor
//! (equip swap, status effect applied or expired, attribute point spent) must
//! call [`StatAggregator::invalidate`]; reads recompute at most once until
//! the next invalidation.

use crate::rules::GameplayRules;
use shared::{CharacterStats, ItemCatalog};
use std::cell::Cell;
use std::collections::HashMap;

/// Borrowed view of every stat contributor a character has. The walk order
/// is fixed: head, body, weapon, custom equipment, status effects, spent
/// attribute points.
pub struct ContributorSet<'a> {
    pub catalog: &'a ItemCatalog,
    pub rules: &'a GameplayRules,
    pub head_id: i32,
    pub body_id: i32,
    pub weapon_id: i32,
    pub custom_equipment_ids: &'a [i32],
    pub status_effect_stats: &'a [CharacterStats],
    pub spent_attributes: &'a HashMap<String, i32>,
}

#[derive(Debug)]
pub struct StatAggregator {
    dirty: Cell<bool>,
    cache: Cell<CharacterStats>,
}

impl Default for StatAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatAggregator {
    pub fn new() -> Self {
        Self {
            dirty: Cell::new(true),
            cache: Cell::new(CharacterStats::default()),
        }
    }

    pub fn invalidate(&self) {
        self.dirty.set(true);
    }

    /// Sum of all contributions, recomputed only when dirty. Unknown item
    /// ids contribute nothing.
    pub fn total(&self, contributors: &ContributorSet) -> CharacterStats {
        if self.dirty.get() {
            self.cache.set(Self::recompute(contributors));
            self.dirty.set(false);
        }
        self.cache.get()
    }

    fn recompute(contributors: &ContributorSet) -> CharacterStats {
        let mut sum = CharacterStats::default();
        if let Some(head) = contributors.catalog.head(contributors.head_id) {
            sum += head.stats;
        }
        if let Some(body) = contributors.catalog.body(contributors.body_id) {
            sum += body.stats;
        }
        if let Some(weapon) = contributors.catalog.weapon(contributors.weapon_id) {
            sum += weapon.stats;
        }
        for id in contributors.custom_equipment_ids {
            if let Some(equipment) = contributors.catalog.custom_equipment(*id) {
                sum += equipment.stats;
            }
        }
        for stats in contributors.status_effect_stats {
            sum += *stats;
        }
        for (name, count) in contributors.spent_attributes {
            if let Some(attribute) = contributors.rules.attribute(name) {
                sum += attribute.stats * *count;
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{default_catalog, make_data_id};

    fn contributors<'a>(
        catalog: &'a ItemCatalog,
        rules: &'a GameplayRules,
        effects: &'a [CharacterStats],
        spent: &'a HashMap<String, i32>,
    ) -> ContributorSet<'a> {
        ContributorSet {
            catalog,
            rules,
            head_id: make_data_id("Rookie Helm"),
            body_id: make_data_id("Scout"),
            weapon_id: make_data_id("Blaster"),
            custom_equipment_ids: &[],
            status_effect_stats: effects,
            spent_attributes: spent,
        }
    }

    #[test]
    fn test_sums_equipment_contributions() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let spent = HashMap::new();
        let aggregator = StatAggregator::new();

        let total = aggregator.total(&contributors(&catalog, &rules, &[], &spent));
        // Rookie Helm hp plus Scout move speed plus Blaster attack.
        assert_eq!(total.add_hp, 20);
        assert_eq!(total.add_move_speed, 5);
        assert_eq!(total.add_attack, 5);
    }

    #[test]
    fn test_unknown_ids_contribute_nothing() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let spent = HashMap::new();
        let aggregator = StatAggregator::new();

        let set = ContributorSet {
            catalog: &catalog,
            rules: &rules,
            head_id: make_data_id("missing"),
            body_id: make_data_id("also missing"),
            weapon_id: 0,
            custom_equipment_ids: &[12345],
            status_effect_stats: &[],
            spent_attributes: &spent,
        };
        assert_eq!(aggregator.total(&set), CharacterStats::default());
    }

    #[test]
    fn test_spent_attributes_multiply() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let mut spent = HashMap::new();
        spent.insert("Might".to_string(), 4);
        let aggregator = StatAggregator::new();

        let total = aggregator.total(&contributors(&catalog, &rules, &[], &spent));
        // Blaster 5 plus 4 Might points at 2 each.
        assert_eq!(total.add_attack, 5 + 8);
    }

    #[test]
    fn test_cache_requires_invalidation() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let spent = HashMap::new();
        let aggregator = StatAggregator::new();

        let effect = CharacterStats {
            add_defend: 15,
            ..Default::default()
        };

        let before = aggregator.total(&contributors(&catalog, &rules, &[], &spent));
        // Contributor changed but the aggregator was not told; stale read.
        let stale = aggregator.total(&contributors(&catalog, &rules, &[effect], &spent));
        assert_eq!(stale, before);

        aggregator.invalidate();
        let fresh = aggregator.total(&contributors(&catalog, &rules, &[effect], &spent));
        assert_eq!(fresh.add_defend, before.add_defend + 15);
    }

    #[test]
    fn test_removal_restores_previous_total() {
        let catalog = default_catalog();
        let rules = GameplayRules::default();
        let spent = HashMap::new();
        let aggregator = StatAggregator::new();

        let effect = CharacterStats {
            add_attack: 7,
            add_exp_rate: 0.25,
            ..Default::default()
        };

        let bare = aggregator.total(&contributors(&catalog, &rules, &[], &spent));
        aggregator.invalidate();
        let buffed = aggregator.total(&contributors(&catalog, &rules, &[effect], &spent));
        assert_eq!(buffed.add_attack, bare.add_attack + 7);
        aggregator.invalidate();
        let restored = aggregator.total(&contributors(&catalog, &rules, &[], &spent));
        assert_eq!(restored, bare);
    }
}
