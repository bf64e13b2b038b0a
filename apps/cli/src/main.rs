#![deny(warnings)]

//! Headless host for the skin-production simulation.
//!
//! Flags configure store file locations only; a round request is a JSON
//! `RoundInput` file. The host performs the collaborator-side range checks,
//! hands validated inputs to the engine, commits the outcome, and renders
//! the result and history tables.

use anyhow::{Context, Result};
use persistence::{commit_round, ensure_initialized, load_catalog, HistoryStore, StateStore};
use sim_core::{validate_round_input, Catalog, RoundInput, RoundState, TIER_RP_PRICES};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    catalog: String,
    state: String,
    history: String,
    input: Option<String>,
    history_only: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        catalog: "champion_data.json".to_string(),
        state: "skin_game_state.jsonl".to_string(),
        history: "game_history.jsonl".to_string(),
        input: None,
        history_only: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--catalog" => {
                if let Some(v) = it.next() {
                    args.catalog = v;
                }
            }
            "--state" => {
                if let Some(v) = it.next() {
                    args.state = v;
                }
            }
            "--history" => {
                if let Some(v) = it.next() {
                    args.history = v;
                }
            }
            "--input" => args.input = it.next(),
            "--history-only" => args.history_only = true,
            _ => {}
        }
    }
    args
}

fn print_history(history_store: &HistoryStore) -> Result<()> {
    let entries = history_store.load_all()?;
    if entries.is_empty() {
        println!("No completed rounds yet.");
        return Ok(());
    }
    println!("Round history");
    println!("{:>5} {:>15} {:>15} {:>15}", "round", "total_sales", "net_profit", "seasonality");
    for e in &entries {
        println!(
            "{:>5} {:>15.2} {:>15.2} {:>15.2}",
            e.round, e.total_sales, e.net_profit, e.new_seasonality
        );
    }
    Ok(())
}

fn print_catalog(catalog: &Catalog) {
    println!("Champion pick rates");
    println!("{:<16} {:>10} {:>12}", "champion", "pick_rate", "saturation");
    for e in catalog.entries() {
        println!("{:<16} {:>10.3} {:>12.2}", e.id, e.pick_rate, e.saturation);
    }
}

fn play_round(
    catalog: &Catalog,
    state: &RoundState,
    input_path: &str,
    state_store: &StateStore,
    history_store: &HistoryStore,
) -> Result<()> {
    let raw = std::fs::read_to_string(input_path)
        .with_context(|| format!("reading round input {input_path}"))?;
    let input: RoundInput =
        serde_json::from_str(&raw).with_context(|| format!("parsing round input {input_path}"))?;
    validate_round_input(&input)?;

    let planned = sim_econ::total_expenses(&input)?;
    println!("Round {} | planned total spend: ${planned:.2}", state.round);

    let outcome = sim_econ::resolve_round(catalog, state, &input)?;
    commit_round(
        state_store,
        history_store,
        &outcome.next_state,
        &outcome.history,
    )?;

    println!("Estimated total sales: ${:.2}", outcome.total_sales);
    println!("Net profit: ${:.2}", outcome.net_profit);
    println!("Updated seasonality: {:.2}", outcome.new_seasonality);
    println!(
        "Round {} complete. Next round: {}.",
        state.round, outcome.next_state.round
    );
    print_catalog(&outcome.updated_catalog);
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(catalog = %args.catalog, state = %args.state, history = %args.history, "starting host");

    let catalog = load_catalog(&args.catalog)?;
    let state_store = StateStore::new(&args.state);
    let history_store = HistoryStore::new(&args.history);
    ensure_initialized(&catalog, &state_store, &history_store)?;

    let state = state_store.load_latest(&catalog)?;
    let catalog = catalog.with_state(&state)?;

    println!("Skin production manager | round {}", state.round);
    println!("Tier RP prices: {TIER_RP_PRICES:?}");

    if args.history_only {
        print_history(&history_store)?;
        print_catalog(&catalog);
        return Ok(());
    }

    let Some(input_path) = args.input.as_deref() else {
        print_history(&history_store)?;
        print_catalog(&catalog);
        println!("Pass --input <round.json> to play a round.");
        return Ok(());
    };

    play_round(&catalog, &state, input_path, &state_store, &history_store)?;
    print_history(&history_store)?;
    Ok(())
}
