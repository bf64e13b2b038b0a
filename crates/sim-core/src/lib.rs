#![deny(warnings)]

//! Core domain models and invariants for Skin Tycoon.
//!
//! This crate defines the serializable types exchanged between the
//! simulation engine, the persistence layer, and the host, along with
//! validation helpers to guarantee basic invariants.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Unique identifier for a champion, e.g. "Ahri", "Lux".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChampionId(pub String);

impl std::fmt::Display for ChampionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One champion in the reference catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChampionEntry {
    /// Champion identifier, unique within the catalog.
    pub id: ChampionId,
    /// Popularity factor in [0,1] scaling sales. Immutable reference data.
    pub pick_rate: f64,
    /// Accumulated market fatigue (>= 0). Evolves across rounds.
    pub saturation: f64,
}

/// The reference catalog: ordered champion entries with unique ids.
///
/// Loaded once per process. After the latest persisted round state is merged
/// in, entry saturations reflect current state rather than the values in the
/// reference file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<ChampionEntry>,
}

impl Catalog {
    /// Build a catalog, enforcing unique ids, non-empty contents, pick rates
    /// in [0,1], and non-negative saturations.
    pub fn new(entries: Vec<ChampionEntry>) -> Result<Self, SimError> {
        if entries.is_empty() {
            return Err(SimError::InvalidInput("catalog is empty".to_string()));
        }
        let mut seen: BTreeSet<&ChampionId> = BTreeSet::new();
        for e in &entries {
            if e.id.0.trim().is_empty() {
                return Err(SimError::InvalidInput(
                    "champion id is blank".to_string(),
                ));
            }
            if !seen.insert(&e.id) {
                return Err(SimError::InvalidInput(format!(
                    "duplicate champion id: {}",
                    e.id
                )));
            }
            if !e.pick_rate.is_finite() || !(0.0..=1.0).contains(&e.pick_rate) {
                return Err(SimError::InvalidInput(format!(
                    "pick rate for {} must be in [0,1]",
                    e.id
                )));
            }
            if !e.saturation.is_finite() || e.saturation < 0.0 {
                return Err(SimError::InvalidInput(format!(
                    "saturation for {} must be >= 0",
                    e.id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> &[ChampionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a champion by id.
    pub fn get(&self, id: &ChampionId) -> Option<&ChampionEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// The set of ids in the catalog.
    pub fn ids(&self) -> BTreeSet<ChampionId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// A copy of this catalog with entry saturations overwritten from `state`.
    ///
    /// The reference file's saturation column is only the bootstrap value;
    /// once a state row exists, it is authoritative.
    pub fn with_state(&self, state: &RoundState) -> Result<Self, SimError> {
        validate_state_against_catalog(state, self)?;
        let entries = self
            .entries
            .iter()
            .map(|e| ChampionEntry {
                id: e.id.clone(),
                pick_rate: e.pick_rate,
                saturation: state.saturations[&e.id],
            })
            .collect();
        Ok(Self { entries })
    }
}

/// Durable per-round state. The latest persisted row is the authoritative
/// current state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// Round counter, starting at 1 for the bootstrap row.
    pub round: u32,
    /// Global demand-ceiling parameter.
    pub seasonality: f64,
    /// Per-champion saturation keyed by id. Key set must equal the catalog.
    pub saturations: BTreeMap<ChampionId, f64>,
}

impl RoundState {
    /// The round-1 bootstrap state: seasonality at its fixed starting value,
    /// saturations taken verbatim from the catalog.
    pub fn bootstrap(catalog: &Catalog) -> Self {
        Self {
            round: 1,
            seasonality: BOOTSTRAP_SEASONALITY,
            saturations: catalog
                .entries()
                .iter()
                .map(|e| (e.id.clone(), e.saturation))
                .collect(),
        }
    }
}

/// One row of the audit/trend ledger, written per completed round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The round that was completed (the pre-advance counter).
    pub round: u32,
    pub total_sales: f64,
    pub net_profit: f64,
    pub new_seasonality: f64,
}

/// A single skin to produce this round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkinChoice {
    /// Champion receiving the skin.
    pub champion: ChampionId,
    /// Rarity/cost class in [1,8].
    pub tier: u8,
}

/// The collaborator-supplied inputs for one round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundInput {
    /// Total budget available for production plus marketing (> 0).
    pub budget: f64,
    /// Budget share spent on marketing (>= 0, <= budget).
    pub marketing_investment: f64,
    /// Popularity of the chosen theme, in [1,5].
    pub theme_value: u8,
    /// Skins to produce, at least one.
    pub skin_choices: Vec<SkinChoice>,
}

/// Production cost per tier, indexed by tier - 1.
pub const TIER_PRODUCTION_COSTS: [f64; 8] = [
    1_000.0, 2_000.0, 4_000.0, 8_000.0, 16_000.0, 30_000.0, 60_000.0, 150_000.0,
];

/// Converted-currency unit price per tier, indexed by tier - 1. The sale
/// price of a skin is the table value times [`PRICE_UNIT_FACTOR`].
pub const TIER_BASE_PRICES: [f64; 8] = [
    104.0, 150.0, 195.0, 270.0, 364.0, 650.0, 1_086.0, 6_486.0,
];

/// Store-facing RP price per tier, for display only.
pub const TIER_RP_PRICES: [u32; 8] = [520, 750, 975, 1_350, 1_820, 3_250, 5_430, 32_430];

/// Multiplier from base unit price to sale price.
pub const PRICE_UNIT_FACTOR: f64 = 6.0;

/// Seasonality assigned to the round-1 bootstrap state.
pub const BOOTSTRAP_SEASONALITY: f64 = 50_000.0;

/// Fixed per-skin volume multiplier applied to each skin's capped sales.
pub const SKIN_VOLUME_MULTIPLIER: f64 = 5.0;

/// Valid tier range.
pub const TIER_RANGE: std::ops::RangeInclusive<u8> = 1..=8;

/// Valid theme-value range.
pub const THEME_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Errors shared across the simulation.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// Planned expenses exceed the budget; the round is not advanced.
    #[error("total expenses {expenses:.2} exceed budget {budget:.2}")]
    BudgetExceeded { expenses: f64, budget: f64 },
    /// Persisted state disagrees with the catalog; fatal, refuse to proceed.
    #[error("persisted state inconsistent with catalog: {0}")]
    StateCorrupt(String),
    /// A skin choice referenced an id absent from the catalog.
    #[error("unknown champion: {0}")]
    UnknownChampion(ChampionId),
    /// Input outside the ranges the collaborator is expected to enforce.
    #[error("invalid round input: {0}")]
    InvalidInput(String),
}

/// Production cost for a tier, rejecting out-of-range tiers.
pub fn production_cost(tier: u8) -> Result<f64, SimError> {
    if !TIER_RANGE.contains(&tier) {
        return Err(SimError::InvalidInput(format!(
            "tier {tier} out of range [1,8]"
        )));
    }
    Ok(TIER_PRODUCTION_COSTS[(tier - 1) as usize])
}

/// Sale price for a tier, rejecting out-of-range tiers.
pub fn sale_price(tier: u8) -> Result<f64, SimError> {
    if !TIER_RANGE.contains(&tier) {
        return Err(SimError::InvalidInput(format!(
            "tier {tier} out of range [1,8]"
        )));
    }
    Ok(TIER_BASE_PRICES[(tier - 1) as usize] * PRICE_UNIT_FACTOR)
}

/// Validate the collaborator-side ranges on a round input.
pub fn validate_round_input(input: &RoundInput) -> Result<(), SimError> {
    if !input.budget.is_finite() || input.budget <= 0.0 {
        return Err(SimError::InvalidInput("budget must be > 0".to_string()));
    }
    if !input.marketing_investment.is_finite() || input.marketing_investment < 0.0 {
        return Err(SimError::InvalidInput(
            "marketing investment must be >= 0".to_string(),
        ));
    }
    if input.marketing_investment > input.budget {
        return Err(SimError::InvalidInput(
            "marketing investment must not exceed budget".to_string(),
        ));
    }
    if !THEME_RANGE.contains(&input.theme_value) {
        return Err(SimError::InvalidInput(format!(
            "theme value {} out of range [1,5]",
            input.theme_value
        )));
    }
    if input.skin_choices.is_empty() {
        return Err(SimError::InvalidInput(
            "at least one skin choice is required".to_string(),
        ));
    }
    for choice in &input.skin_choices {
        if !TIER_RANGE.contains(&choice.tier) {
            return Err(SimError::InvalidInput(format!(
                "tier {} out of range [1,8]",
                choice.tier
            )));
        }
    }
    Ok(())
}

/// Check that a state row's saturation key set equals the catalog id set.
pub fn validate_state_against_catalog(
    state: &RoundState,
    catalog: &Catalog,
) -> Result<(), SimError> {
    if state.round == 0 {
        return Err(SimError::StateCorrupt("round counter is 0".to_string()));
    }
    let catalog_ids = catalog.ids();
    let state_ids: BTreeSet<ChampionId> = state.saturations.keys().cloned().collect();
    if let Some(missing) = catalog_ids.difference(&state_ids).next() {
        return Err(SimError::StateCorrupt(format!(
            "no saturation recorded for champion {missing}"
        )));
    }
    if let Some(extra) = state_ids.difference(&catalog_ids).next() {
        return Err(SimError::StateCorrupt(format!(
            "saturation recorded for unknown champion {extra}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(id: &str, pick_rate: f64, saturation: f64) -> ChampionEntry {
        ChampionEntry {
            id: ChampionId(id.to_string()),
            pick_rate,
            saturation,
        }
    }

    fn small_catalog() -> Catalog {
        Catalog::new(vec![
            entry("Ahri", 0.25, 0.0),
            entry("Lux", 0.18, 0.4),
        ])
        .unwrap()
    }

    #[test]
    fn serde_roundtrip_round_state() {
        let state = RoundState::bootstrap(&small_catalog());
        let s = serde_json::to_string(&state).unwrap();
        let back: RoundState = serde_json::from_str(&s).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.round, 1);
        assert_eq!(back.seasonality, BOOTSTRAP_SEASONALITY);
    }

    #[test]
    fn catalog_rejects_duplicates_and_bad_rates() {
        assert!(Catalog::new(vec![entry("Ahri", 0.2, 0.0), entry("Ahri", 0.3, 0.0)]).is_err());
        assert!(Catalog::new(vec![entry("Ahri", 1.2, 0.0)]).is_err());
        assert!(Catalog::new(vec![entry("Ahri", 0.2, -0.1)]).is_err());
        assert!(Catalog::new(vec![]).is_err());
    }

    #[test]
    fn bootstrap_copies_catalog_saturations() {
        let catalog = small_catalog();
        let state = RoundState::bootstrap(&catalog);
        assert_eq!(state.saturations.len(), catalog.len());
        assert_eq!(state.saturations[&ChampionId("Lux".to_string())], 0.4);
    }

    #[test]
    fn with_state_overwrites_saturation() {
        let catalog = small_catalog();
        let mut state = RoundState::bootstrap(&catalog);
        state
            .saturations
            .insert(ChampionId("Ahri".to_string()), 1.5);
        let merged = catalog.with_state(&state).unwrap();
        assert_eq!(
            merged.get(&ChampionId("Ahri".to_string())).unwrap().saturation,
            1.5
        );
        // pick rates are untouched reference data
        assert_eq!(
            merged.get(&ChampionId("Lux".to_string())).unwrap().pick_rate,
            0.18
        );
    }

    #[test]
    fn state_catalog_mismatch_is_corrupt() {
        let catalog = small_catalog();
        let mut state = RoundState::bootstrap(&catalog);
        state.saturations.remove(&ChampionId("Lux".to_string()));
        assert!(matches!(
            validate_state_against_catalog(&state, &catalog),
            Err(SimError::StateCorrupt(_))
        ));
        state
            .saturations
            .insert(ChampionId("Lux".to_string()), 0.4);
        state
            .saturations
            .insert(ChampionId("Zed".to_string()), 0.0);
        assert!(matches!(
            validate_state_against_catalog(&state, &catalog),
            Err(SimError::StateCorrupt(_))
        ));
    }

    #[test]
    fn input_range_validation() {
        let good = RoundInput {
            budget: 10_000.0,
            marketing_investment: 0.0,
            theme_value: 3,
            skin_choices: vec![SkinChoice {
                champion: ChampionId("Ahri".to_string()),
                tier: 1,
            }],
        };
        assert!(validate_round_input(&good).is_ok());

        let mut bad = good.clone();
        bad.budget = 0.0;
        assert!(validate_round_input(&bad).is_err());

        let mut bad = good.clone();
        bad.marketing_investment = 20_000.0;
        assert!(validate_round_input(&bad).is_err());

        let mut bad = good.clone();
        bad.theme_value = 6;
        assert!(validate_round_input(&bad).is_err());

        let mut bad = good.clone();
        bad.skin_choices.clear();
        assert!(validate_round_input(&bad).is_err());

        let mut bad = good;
        bad.skin_choices[0].tier = 9;
        assert!(validate_round_input(&bad).is_err());
    }

    #[test]
    fn tier_tables_reject_out_of_range() {
        assert!(production_cost(0).is_err());
        assert!(production_cost(9).is_err());
        assert_eq!(production_cost(1).unwrap(), 1_000.0);
        assert_eq!(production_cost(8).unwrap(), 150_000.0);
        assert_eq!(sale_price(1).unwrap(), 624.0);
        assert_eq!(sale_price(8).unwrap(), 6_486.0 * 6.0);
    }

    proptest! {
        #[test]
        fn valid_tiers_always_priced(tier in 1u8..=8) {
            let cost = production_cost(tier).unwrap();
            let price = sale_price(tier).unwrap();
            prop_assert!(cost > 0.0);
            prop_assert!(price > 0.0);
        }

        #[test]
        fn costs_monotonic_in_tier(tier in 1u8..8) {
            prop_assert!(production_cost(tier + 1).unwrap() > production_cost(tier).unwrap());
            prop_assert!(sale_price(tier + 1).unwrap() > sale_price(tier).unwrap());
        }
    }
}
