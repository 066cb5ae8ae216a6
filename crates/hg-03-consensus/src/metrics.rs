//! # Consensus Metrics
//!
//! Enable with the `metrics` feature.
//!
//! ## Metrics Exported
//!
//! - `consensus_rounds_decided_total` - Rounds whose fame election completed
//! - `consensus_events_total` - Events that reached consensus
//! - `consensus_coin_votes_total` - Votes cast in coin rounds
//! - `consensus_latest_decided_round` - Gauge of the latest decided round

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref ROUNDS_DECIDED: IntCounter = register_int_counter!(
        "consensus_rounds_decided_total",
        "Total number of rounds decided"
    )
    .expect("Failed to create ROUNDS_DECIDED metric");

    pub static ref CONSENSUS_EVENTS: IntCounter = register_int_counter!(
        "consensus_events_total",
        "Total number of events that reached consensus"
    )
    .expect("Failed to create CONSENSUS_EVENTS metric");

    pub static ref COIN_VOTES: IntCounter = register_int_counter!(
        "consensus_coin_votes_total",
        "Total number of votes cast in coin rounds"
    )
    .expect("Failed to create COIN_VOTES metric");

    pub static ref LATEST_DECIDED_ROUND: IntGauge = register_int_gauge!(
        "consensus_latest_decided_round",
        "Latest round whose famous witnesses are decided"
    )
    .expect("Failed to create LATEST_DECIDED_ROUND metric");
}

/// Record a decided round and how many events it ordered
#[cfg(feature = "metrics")]
pub fn record_round_decided(round: u64, events: usize) {
    ROUNDS_DECIDED.inc();
    CONSENSUS_EVENTS.inc_by(events as u64);
    LATEST_DECIDED_ROUND.set(i64::try_from(round).unwrap_or(i64::MAX));
}

#[cfg(feature = "metrics")]
pub fn record_coin_vote() {
    COIN_VOTES.inc();
}

#[cfg(not(feature = "metrics"))]
pub fn record_round_decided(_round: u64, _events: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_coin_vote() {}
