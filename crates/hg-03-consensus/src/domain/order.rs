//! # Consensus Ordering
//!
//! Receive times, whitening and the total order of a decided round.
//!
//! ```text
//!   judge J (node A)            for each judge, walk its self-chain oldest
//!      │                        first; the first self-ancestor that reaches
//!   A3 ┤                        an event stamps its receive time.
//!      │   ╲
//!   A2 ┤    B2 ── ...           median of the per-judge receive times is the
//!      │   ╱                    event's consensus timestamp
//!   A1 ┘ B1
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use shared_types::{EventHash, Timestamp, MIN_TRANS_TIMESTAMP_INCR_NANOS};

use super::store::{EventId, EventStore, LinkedEvent};

/// XOR of all judge hashes, used to scramble the final tie-break.
pub fn whitening<'a>(judge_hashes: impl IntoIterator<Item = &'a EventHash>) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for hash in judge_hashes {
        if out.len() < hash.len() {
            out.resize(hash.len(), 0);
        }
        for (o, b) in out.iter_mut().zip(hash.as_bytes()) {
            *o ^= b;
        }
    }
    out
}

/// Pseudo-random vote derived from a signature.
pub fn coin(signature: &[u8]) -> bool {
    signature
        .get(signature.len() / 2)
        .is_some_and(|b| b & 1 == 1)
}

/// Timestamp of the last transaction of an event ordered at `timestamp`.
pub fn last_transaction_time(timestamp: Timestamp, transaction_count: usize) -> Timestamp {
    let extra = transaction_count.max(1) as u64 - 1;
    timestamp.plus_nanos(extra.saturating_mul(MIN_TRANS_TIMESTAMP_INCR_NANOS))
}

/// Earliest timestamp the next consensus event may receive.
pub fn min_next_timestamp(last: Timestamp) -> Timestamp {
    last.plus_nanos(MIN_TRANS_TIMESTAMP_INCR_NANOS)
}

/// Events that are ancestors of every judge, with their median receive time.
///
/// Only events accepted by `is_live` are visited; their ancestors are not
/// explored further.
pub fn common_ancestors(
    store: &EventStore,
    judges: &[EventId],
    is_live: impl Fn(&LinkedEvent) -> bool,
) -> Vec<(EventId, Timestamp)> {
    let mut times: HashMap<EventId, Vec<Timestamp>> = HashMap::new();

    for &judge in judges {
        let mut chain = Vec::new();
        let mut cursor = Some(judge);
        while let Some(id) = cursor {
            match store.get(id) {
                Some(event) if is_live(event) || id == judge => {
                    chain.push(id);
                    cursor = event.self_parent();
                }
                _ => break,
            }
        }

        let mut visited = HashSet::new();
        for &received_by in chain.iter().rev() {
            let Some(stamp) = store.get(received_by).map(LinkedEvent::time_created) else {
                continue;
            };
            let mut stack = vec![received_by];
            while let Some(id) = stack.pop() {
                if !visited.insert(id) {
                    continue;
                }
                let Some(event) = store.get(id) else {
                    continue;
                };
                if !is_live(event) {
                    continue;
                }
                times.entry(id).or_default().push(stamp);
                stack.extend(event.all_parents().iter().copied());
            }
        }
    }

    times
        .into_iter()
        .filter(|(_, t)| t.len() == judges.len())
        .map(|(id, mut t)| {
            t.sort_unstable();
            (id, t[t.len() / 2])
        })
        .collect()
}

/// Sort by timestamp, then deterministic generation, then whitened hash.
///
/// The generation stamped by the orphan buffer is not used: it skips parents
/// that happened to be ancient on arrival and so differs between replicas.
pub fn sort_for_consensus(store: &EventStore, events: &mut [(EventId, Timestamp)], whitening: &[u8]) {
    events.sort_by(|(a, ta), (b, tb)| {
        ta.cmp(tb).then_with(|| match (store.get(*a), store.get(*b)) {
            (Some(ea), Some(eb)) => ea
                .de_gen()
                .cmp(&eb.de_gen())
                .then_with(|| compare_whitened(ea.hash(), eb.hash(), whitening)),
            _ => a.cmp(b),
        })
    });
}

fn compare_whitened(a: &EventHash, b: &EventHash, whitening: &[u8]) -> Ordering {
    let key = |hash: &EventHash| -> Vec<u8> {
        hash.as_bytes()
            .iter()
            .enumerate()
            .map(|(i, byte)| byte ^ whitening.get(i).copied().unwrap_or(0))
            .collect()
    };
    key(a).cmp(&key(b))
}
