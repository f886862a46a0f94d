//! Keyed entity storage
//!
//! Every derived record lives under an `EntityKey`. The engine never writes
//! to a store directly: handlers write into a `StagedStore` overlay, and the
//! overlay's `WriteBatch` is committed in one call once the event succeeded.
//! A dropped event simply discards its overlay.

use crate::entities::{
    Arbitrable, Checkpoint, Court, CourtStake, Dispute, Draw, GlobalCounters, Juror, PhaseChange,
    PolicyUpdate, RewardShift, Round, StakeSet, Vote,
};
use crate::events::EventPosition;
use crate::ids::{Address, CourtId, DisputeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

/// Storage key of a derived record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKey {
    /// The singleton global counters
    Counters,
    /// The singleton replay checkpoint
    Checkpoint,
    /// Court by id
    Court(CourtId),
    /// Juror by address
    Juror(Address),
    /// Stake of a juror in a court
    CourtStake {
        /// Juror address
        juror: Address,
        /// Court id
        court: CourtId,
    },
    /// Dispute by id
    Dispute(DisputeId),
    /// Round of a dispute
    Round {
        /// Dispute id
        dispute: DisputeId,
        /// Round number
        number: u64,
    },
    /// Vote slot of a round
    Vote {
        /// Dispute id
        dispute: DisputeId,
        /// Round number
        round: u64,
        /// Slot
        slot: u64,
    },
    /// Arbitrable by address
    Arbitrable(Address),
    /// Policy by court
    Policy(CourtId),
    /// Stake audit record
    StakeSet(EventPosition),
    /// Draw audit record
    Draw {
        /// Dispute id
        dispute: DisputeId,
        /// Round number
        round: u64,
        /// Slot
        slot: u64,
    },
    /// Period-change audit record
    PhaseChange(EventPosition),
    /// Reward audit record
    RewardShift(EventPosition),
}

impl EntityKey {
    /// Key of a juror's stake in a court
    pub fn court_stake(juror: Address, court: CourtId) -> Self {
        Self::CourtStake { juror, court }
    }

    /// Key of a dispute round
    pub fn round(dispute: DisputeId, number: u64) -> Self {
        Self::Round { dispute, number }
    }

    /// Key of a vote slot
    pub fn vote(dispute: DisputeId, round: u64, slot: u64) -> Self {
        Self::Vote {
            dispute,
            round,
            slot,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counters => write!(f, "counters"),
            Self::Checkpoint => write!(f, "checkpoint"),
            Self::Court(id) => write!(f, "court {id}"),
            Self::Juror(id) => write!(f, "juror {id}"),
            Self::CourtStake { juror, court } => write!(f, "stake {juror}@{court}"),
            Self::Dispute(id) => write!(f, "dispute {id}"),
            Self::Round { dispute, number } => write!(f, "round {dispute}/{number}"),
            Self::Vote {
                dispute,
                round,
                slot,
            } => write!(f, "vote {dispute}/{round}/{slot}"),
            Self::Arbitrable(id) => write!(f, "arbitrable {id}"),
            Self::Policy(court) => write!(f, "policy {court}"),
            Self::StakeSet(pos) => write!(f, "stake-set {pos}"),
            Self::Draw {
                dispute,
                round,
                slot,
            } => write!(f, "draw {dispute}/{round}/{slot}"),
            Self::PhaseChange(pos) => write!(f, "phase-change {pos}"),
            Self::RewardShift(pos) => write!(f, "reward-shift {pos}"),
        }
    }
}

/// A stored record of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// Global counters
    Counters(GlobalCounters),
    /// Replay checkpoint
    Checkpoint(Checkpoint),
    /// Court
    Court(Court),
    /// Juror
    Juror(Juror),
    /// Court stake
    CourtStake(CourtStake),
    /// Dispute
    Dispute(Dispute),
    /// Round
    Round(Round),
    /// Vote
    Vote(Vote),
    /// Arbitrable
    Arbitrable(Arbitrable),
    /// Policy
    Policy(PolicyUpdate),
    /// Stake audit record
    StakeSet(StakeSet),
    /// Draw audit record
    Draw(Draw),
    /// Period-change audit record
    PhaseChange(PhaseChange),
    /// Reward audit record
    RewardShift(RewardShift),
}

/// A record type that can live in an `EntityStore`.
pub trait StoredEntity: Clone + Sized {
    /// Key this record is stored under
    fn key(&self) -> EntityKey;

    /// Wrap into the stored form
    fn into_entity(self) -> Entity;

    /// Unwrap an owned stored form of this type
    fn from_entity(entity: Entity) -> Option<Self>;

    /// Unwrap a borrowed stored form of this type
    fn from_entity_ref(entity: &Entity) -> Option<&Self>;
}

macro_rules! stored_entity {
    ($ty:ty, $variant:ident, |$this:ident| $key:expr) => {
        impl StoredEntity for $ty {
            fn key(&self) -> EntityKey {
                let $this = self;
                $key
            }

            fn into_entity(self) -> Entity {
                Entity::$variant(self)
            }

            fn from_entity(entity: Entity) -> Option<Self> {
                match entity {
                    Entity::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_entity_ref(entity: &Entity) -> Option<&Self> {
                match entity {
                    Entity::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

stored_entity!(GlobalCounters, Counters, |_c| EntityKey::Counters);
stored_entity!(Checkpoint, Checkpoint, |_c| EntityKey::Checkpoint);
stored_entity!(Court, Court, |c| EntityKey::Court(c.id));
stored_entity!(Juror, Juror, |j| EntityKey::Juror(j.id));
stored_entity!(CourtStake, CourtStake, |s| EntityKey::court_stake(s.juror, s.court));
stored_entity!(Dispute, Dispute, |d| EntityKey::Dispute(d.id));
stored_entity!(Round, Round, |r| EntityKey::round(r.dispute, r.number));
stored_entity!(Vote, Vote, |v| EntityKey::vote(v.dispute, v.round, v.slot));
stored_entity!(Arbitrable, Arbitrable, |a| EntityKey::Arbitrable(a.id));
stored_entity!(PolicyUpdate, Policy, |p| EntityKey::Policy(p.court));
stored_entity!(StakeSet, StakeSet, |s| EntityKey::StakeSet(s.position));
stored_entity!(Draw, Draw, |d| EntityKey::Draw {
    dispute: d.dispute,
    round: d.round,
    slot: d.slot,
});
stored_entity!(PhaseChange, PhaseChange, |p| EntityKey::PhaseChange(p.position));
stored_entity!(RewardShift, RewardShift, |r| EntityKey::RewardShift(r.position));

impl Entity {
    /// Key of the wrapped record
    pub fn key(&self) -> EntityKey {
        match self {
            Entity::Counters(e) => e.key(),
            Entity::Checkpoint(e) => e.key(),
            Entity::Court(e) => e.key(),
            Entity::Juror(e) => e.key(),
            Entity::CourtStake(e) => e.key(),
            Entity::Dispute(e) => e.key(),
            Entity::Round(e) => e.key(),
            Entity::Vote(e) => e.key(),
            Entity::Arbitrable(e) => e.key(),
            Entity::Policy(e) => e.key(),
            Entity::StakeSet(e) => e.key(),
            Entity::Draw(e) => e.key(),
            Entity::PhaseChange(e) => e.key(),
            Entity::RewardShift(e) => e.key(),
        }
    }
}

/// Upserts produced by one event, committed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: BTreeMap<EntityKey, Entity>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a record, replacing any earlier write to the same key.
    pub fn put<T: StoredEntity>(&mut self, value: T) {
        self.writes.insert(value.key(), value.into_entity());
    }

    /// Stage a raw entity
    pub fn put_entity(&mut self, entity: Entity) {
        self.writes.insert(entity.key(), entity);
    }

    /// Staged entity under `key`
    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.writes.get(key)
    }

    /// Number of staged writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Staged keys in key order
    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.writes.keys()
    }
}

impl IntoIterator for WriteBatch {
    type Item = (EntityKey, Entity);
    type IntoIter = std::collections::btree_map::IntoIter<EntityKey, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

/// Generic keyed store of derived records.
pub trait EntityStore {
    /// Load the record stored under `key`.
    fn load(&self, key: &EntityKey) -> Option<Entity>;

    /// Apply every write of a batch.
    fn commit(&mut self, batch: WriteBatch);

    /// Whether a record exists under `key`.
    fn contains(&self, key: &EntityKey) -> bool {
        self.load(key).is_some()
    }

    /// Load a typed record.
    fn get<T: StoredEntity>(&self, key: &EntityKey) -> Option<T>
    where
        Self: Sized,
    {
        self.load(key).and_then(T::from_entity)
    }
}

/// In-memory store ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entities: BTreeMap<EntityKey, Entity>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Borrow a typed record
    pub fn get_ref<T: StoredEntity>(&self, key: &EntityKey) -> Option<&T> {
        self.entities.get(key).and_then(T::from_entity_ref)
    }

    /// Every stored record of type `T`, in key order.
    pub fn all<T: StoredEntity>(&self) -> Vec<T> {
        self.entities
            .values()
            .filter_map(T::from_entity_ref)
            .cloned()
            .collect()
    }

    /// Iterate over all records
    pub fn entries(&self) -> impl Iterator<Item = (&EntityKey, &Entity)> {
        self.entities.iter()
    }
}

impl EntityStore for MemoryStore {
    fn load(&self, key: &EntityKey) -> Option<Entity> {
        self.entities.get(key).cloned()
    }

    fn commit(&mut self, batch: WriteBatch) {
        trace!(writes = batch.len(), "committing batch");
        self.entities.extend(batch);
    }

    fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }
}

/// Per-event overlay over a read-only base store.
///
/// Reads see staged writes first. Nothing reaches the base until the caller
/// commits `into_batch()`.
pub struct StagedStore<'a> {
    base: &'a dyn EntityStore,
    pending: WriteBatch,
}

impl<'a> StagedStore<'a> {
    /// Create an empty overlay
    pub fn new(base: &'a dyn EntityStore) -> Self {
        Self {
            base,
            pending: WriteBatch::new(),
        }
    }

    /// Load a typed record, staged writes first.
    pub fn get<T: StoredEntity>(&self, key: &EntityKey) -> Option<T> {
        match self.pending.get(key) {
            Some(entity) => T::from_entity_ref(entity).cloned(),
            None => self.base.load(key).and_then(T::from_entity),
        }
    }

    /// Whether a record exists in the overlay or the base.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.pending.get(key).is_some() || self.base.contains(key)
    }

    /// Stage a record
    pub fn put<T: StoredEntity>(&mut self, value: T) {
        self.pending.put(value);
    }

    /// Number of staged writes
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Consume the overlay into its batch
    pub fn into_batch(self) -> WriteBatch {
        self.pending
    }
}

impl fmt::Debug for StagedStore<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedStore")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
