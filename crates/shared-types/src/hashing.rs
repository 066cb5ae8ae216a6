//! # Canonical Hashing
//!
//! Events and rosters are identified by the SHA-384 digest of a canonical,
//! length-prefixed big-endian encoding. The signature is not part of the
//! encoding: the creator signs the resulting hash.

use sha2::{Digest, Sha384};

use crate::entities::{EventDescriptor, EventHash, GossipEvent};
use crate::roster::{Roster, RosterHash};

const TAG_ABSENT: u8 = 0;
const TAG_PRESENT: u8 = 1;

/// Digest of an event's core, parents and transactions.
pub fn hash_gossip_event(event: &GossipEvent) -> EventHash {
    let mut hasher = Sha384::new();

    hasher.update(event.core.creator_id.0.to_be_bytes());
    hasher.update(event.core.birth_round.to_be_bytes());
    match event.core.time_created {
        Some(ts) => {
            hasher.update([TAG_PRESENT]);
            hasher.update(ts.0.to_be_bytes());
        }
        None => hasher.update([TAG_ABSENT]),
    }

    hasher.update((event.parents.len() as u64).to_be_bytes());
    for parent in &event.parents {
        match parent {
            Some(descriptor) => {
                hasher.update([TAG_PRESENT]);
                update_descriptor(&mut hasher, descriptor);
            }
            None => hasher.update([TAG_ABSENT]),
        }
    }

    hasher.update((event.transactions.len() as u64).to_be_bytes());
    for tx in &event.transactions {
        hasher.update((tx.len() as u64).to_be_bytes());
        hasher.update(tx);
    }

    EventHash(hasher.finalize().to_vec())
}

fn update_descriptor(hasher: &mut Sha384, descriptor: &EventDescriptor) {
    hasher.update((descriptor.hash.len() as u64).to_be_bytes());
    hasher.update(descriptor.hash.as_bytes());
    hasher.update(descriptor.creator.0.to_be_bytes());
    hasher.update(descriptor.birth_round.to_be_bytes());
}

/// Digest of a roster's entries in order.
pub fn hash_roster(roster: &Roster) -> RosterHash {
    let mut hasher = Sha384::new();
    hasher.update((roster.len() as u64).to_be_bytes());
    for entry in roster.entries() {
        hasher.update(entry.node_id.0.to_be_bytes());
        hasher.update(entry.weight.to_be_bytes());
        hasher.update((entry.public_key.len() as u64).to_be_bytes());
        hasher.update(&entry.public_key);
    }
    RosterHash(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EventCore, NodeId, Timestamp};

    fn gossip(tx: &[u8]) -> GossipEvent {
        GossipEvent {
            core: EventCore {
                creator_id: NodeId(4),
                birth_round: 1,
                time_created: Some(Timestamp(99)),
            },
            parents: vec![],
            transactions: vec![tx.to_vec()],
            signature: vec![1; 64],
        }
    }

    #[test]
    fn test_signature_does_not_affect_hash() {
        let a = gossip(b"a");
        let mut b = a.clone();
        b.signature = vec![2; 64];
        assert_eq!(hash_gossip_event(&a), hash_gossip_event(&b));
    }

    #[test]
    fn test_transactions_affect_hash() {
        assert_ne!(hash_gossip_event(&gossip(b"a")), hash_gossip_event(&gossip(b"b")));
    }

    #[test]
    fn test_transaction_boundaries_are_length_prefixed() {
        let mut split = gossip(b"ab");
        split.transactions = vec![b"a".to_vec(), b"b".to_vec()];
        assert_ne!(hash_gossip_event(&split), hash_gossip_event(&gossip(b"ab")));
    }
}
