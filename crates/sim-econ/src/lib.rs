#![deny(warnings)]

//! Economic engine: resolves one round of skin production.
//!
//! The engine is a pure function over values: it takes the catalog, the
//! current round state, and the collaborator-supplied inputs, and returns
//! the computed outcome including the next state and the updated catalog.
//! It performs no I/O and mutates no shared state; committing the outcome
//! to disk is the persistence layer's job.

use serde::{Deserialize, Serialize};
use sim_core::{
    production_cost, sale_price, validate_round_input, validate_state_against_catalog, Catalog,
    ChampionId, HistoryEntry, RoundInput, RoundState, SimError, SKIN_VOLUME_MULTIPLIER,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Everything a completed round produces: display figures, the ledger row,
/// the next authoritative state, and the catalog view merged with it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub total_sales: f64,
    pub net_profit: f64,
    pub new_seasonality: f64,
    /// Ledger row for the round that was just completed.
    pub history: HistoryEntry,
    /// State for the next round; becomes authoritative once committed.
    pub next_state: RoundState,
    /// Catalog with saturations advanced to `next_state`.
    pub updated_catalog: Catalog,
}

/// Total planned spend for a round: production costs plus marketing.
///
/// Exposed separately so the host can show the planned figure before the
/// round is resolved.
pub fn total_expenses(input: &RoundInput) -> Result<f64, SimError> {
    let mut production = 0.0;
    for choice in &input.skin_choices {
        production += production_cost(choice.tier)?;
    }
    Ok(production + input.marketing_investment)
}

/// Demand multiplier for one skin: saturation fatigue, theme popularity,
/// and champion pick rate.
pub fn sales_multiplier(saturation: f64, theme_value: u8, pick_rate: f64) -> f64 {
    (1.0 - saturation.ln_1p() * 0.5) * (1.0 + f64::from(theme_value).ln_1p() * 1.2) * pick_rate
}

/// Marketing amplification applied to the round's aggregate sales.
pub fn marketing_boost(marketing_investment: f64) -> f64 {
    marketing_investment.ln_1p() * 1.5
}

/// Demand ceiling for a single skin's sales, driven by seasonality and
/// marketing reach.
pub fn sales_cap(seasonality: f64, marketing_investment: f64) -> f64 {
    seasonality + marketing_investment * 0.3
}

/// Resolve one round.
///
/// Either fully computes an outcome or fails with a typed error and no
/// effect. All skin choices read the same baseline saturation (the value in
/// `state`); saturation increments land in `next_state` and only become
/// visible in the following round. Repeated choices for one champion
/// accumulate their increments.
pub fn resolve_round(
    catalog: &Catalog,
    state: &RoundState,
    input: &RoundInput,
) -> Result<RoundOutcome, SimError> {
    validate_round_input(input)?;
    validate_state_against_catalog(state, catalog)?;

    let expenses = total_expenses(input)?;
    if expenses > input.budget {
        return Err(SimError::BudgetExceeded {
            expenses,
            budget: input.budget,
        });
    }

    let cap = sales_cap(state.seasonality, input.marketing_investment);
    let mut total_sales = 0.0;
    let mut saturation_deltas: BTreeMap<ChampionId, f64> = BTreeMap::new();

    for choice in &input.skin_choices {
        let champion = catalog
            .get(&choice.champion)
            .ok_or_else(|| SimError::UnknownChampion(choice.champion.clone()))?;
        let baseline = state
            .saturations
            .get(&champion.id)
            .copied()
            .ok_or_else(|| {
                SimError::StateCorrupt(format!("no saturation recorded for champion {}", champion.id))
            })?;

        let price = sale_price(choice.tier)?;
        let multiplier = sales_multiplier(baseline, input.theme_value, champion.pick_rate);
        let sales = (price * multiplier).min(cap);
        total_sales += sales * SKIN_VOLUME_MULTIPLIER;

        debug!(
            champion = %champion.id,
            tier = choice.tier,
            price,
            multiplier,
            sales,
            "skin resolved"
        );

        *saturation_deltas.entry(champion.id.clone()).or_insert(0.0) +=
            f64::from(choice.tier) * 0.1;
    }

    total_sales *= (1.0 + marketing_boost(input.marketing_investment)) * 2.0;
    let net_profit = total_sales - expenses;
    let new_seasonality =
        state.seasonality + input.marketing_investment * 0.1 - net_profit * 0.05;

    let mut saturations = state.saturations.clone();
    for (id, delta) in saturation_deltas {
        if let Some(s) = saturations.get_mut(&id) {
            *s += delta;
        }
    }
    let next_state = RoundState {
        round: state.round + 1,
        seasonality: new_seasonality,
        saturations,
    };
    let updated_catalog = catalog.with_state(&next_state)?;

    info!(
        round = state.round,
        total_sales, net_profit, new_seasonality, "round resolved"
    );

    Ok(RoundOutcome {
        total_sales,
        net_profit,
        new_seasonality,
        history: HistoryEntry {
            round: state.round,
            total_sales,
            net_profit,
            new_seasonality,
        },
        next_state,
        updated_catalog,
    })
}
