use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use attest_types::{Amount, AtomId, ContentUri, EntityId, TripleId, TxHash};

use crate::error::{LedgerError, RevertReason};
use crate::receipt::WriteReceipt;
use crate::traits::{LedgerReader, LedgerWriter};

const DEFAULT_ATOM_COST: u128 = 100;
const DEFAULT_TRIPLE_COST: u128 = 300;
const DEFAULT_BALANCE: u128 = 1_000_000;

/// In-memory ledger used for tests, local demos, and embedding.
///
/// Enforces the same semantics the engine relies on from a real ledger:
/// global uniqueness of atoms and triples, atomic batch writes (a rejected
/// transaction mutates nothing), balance-funded creation costs, and
/// input-ordered receipt ids.
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

struct LedgerState {
    atoms: HashMap<AtomId, ContentUri>,
    triples: HashMap<TripleId, (AtomId, AtomId, AtomId)>,
    atom_cost: Amount,
    triple_cost: Amount,
    balance: Amount,
    nonce: u64,
    write_count: usize,
    /// Entities that existence reads do not see yet, although creates still
    /// collide with them. Simulates a reader lagging behind a competing
    /// writer, which is exactly the race the engine's revert reclassification
    /// covers.
    lagging: HashSet<EntityId>,
    /// Number of upcoming reads that fail with a transient error.
    read_faults: usize,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            atoms: HashMap::new(),
            triples: HashMap::new(),
            atom_cost: Amount::new(DEFAULT_ATOM_COST),
            triple_cost: Amount::new(DEFAULT_TRIPLE_COST),
            balance: Amount::new(DEFAULT_BALANCE),
            nonce: 0,
            write_count: 0,
            lagging: HashSet::new(),
            read_faults: 0,
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
        }
    }
}

impl InMemoryLedger {
    pub fn new(atom_cost: Amount, triple_cost: Amount, balance: Amount) -> Self {
        Self {
            inner: RwLock::new(LedgerState {
                atom_cost,
                triple_cost,
                balance,
                ..LedgerState::default()
            }),
        }
    }

    pub fn set_atom_cost(&self, cost: Amount) {
        self.write_state().atom_cost = cost;
    }

    pub fn set_triple_cost(&self, cost: Amount) {
        self.write_state().triple_cost = cost;
    }

    pub fn set_balance(&self, balance: Amount) {
        self.write_state().balance = balance;
    }

    pub fn balance(&self) -> Amount {
        self.read_state().balance
    }

    /// Number of write transactions the ledger has accepted.
    pub fn write_count(&self) -> usize {
        self.read_state().write_count
    }

    pub fn contains_atom(&self, id: AtomId) -> bool {
        self.read_state().atoms.contains_key(&id)
    }

    pub fn contains_triple(&self, id: TripleId) -> bool {
        self.read_state().triples.contains_key(&id)
    }

    /// Hide an entity from existence reads while keeping it authoritative
    /// for writes. A subsequent create of the same entity reverts with an
    /// already-exists reason, reproducing the optimistic check-then-create
    /// race.
    pub fn conceal_from_reads(&self, id: EntityId) {
        self.write_state().lagging.insert(id);
    }

    /// Make the next `count` reads fail with a transient query error.
    pub fn fail_next_reads(&self, count: usize) {
        self.write_state().read_faults = count;
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, LedgerState> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, LedgerState> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_read_fault(state: &mut LedgerState) -> Result<(), LedgerError> {
        if state.read_faults > 0 {
            state.read_faults -= 1;
            return Err(LedgerError::transient("injected read fault"));
        }
        Ok(())
    }

    fn charge(
        state: &mut LedgerState,
        costs: &[Amount],
        floor: Amount,
    ) -> Result<(), LedgerError> {
        let mut total = Amount::ZERO;
        for cost in costs {
            if *cost < floor {
                return Err(LedgerError::reverted(RevertReason::InsufficientFunds));
            }
            total = total
                .checked_add(*cost)
                .ok_or_else(|| LedgerError::reverted(RevertReason::InsufficientFunds))?;
        }
        if state.balance < total {
            return Err(LedgerError::reverted(RevertReason::InsufficientFunds));
        }
        state.balance = state.balance.saturating_sub(total);
        Ok(())
    }

    fn seal_transaction(state: &mut LedgerState, ids: &[[u8; 32]]) -> TxHash {
        state.nonce += 1;
        state.write_count += 1;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"attest-tx-v1:");
        hasher.update(&state.nonce.to_le_bytes());
        for id in ids {
            hasher.update(id);
        }
        TxHash::from_bytes(*hasher.finalize().as_bytes())
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn is_entity_created(&self, id: EntityId) -> Result<bool, LedgerError> {
        let mut state = self.write_state();
        Self::take_read_fault(&mut state)?;
        if state.lagging.contains(&id) {
            return Ok(false);
        }
        let as_atom = AtomId::from_bytes(*id.as_bytes());
        let as_triple = TripleId::from_bytes(*id.as_bytes());
        Ok(state.atoms.contains_key(&as_atom) || state.triples.contains_key(&as_triple))
    }

    async fn atom_cost(&self) -> Result<Amount, LedgerError> {
        let mut state = self.write_state();
        Self::take_read_fault(&mut state)?;
        Ok(state.atom_cost)
    }

    async fn triple_cost(&self) -> Result<Amount, LedgerError> {
        let mut state = self.write_state();
        Self::take_read_fault(&mut state)?;
        Ok(state.triple_cost)
    }

    async fn triple(&self, id: TripleId) -> Result<(AtomId, AtomId, AtomId), LedgerError> {
        let mut state = self.write_state();
        Self::take_read_fault(&mut state)?;
        state
            .triples
            .get(&id)
            .copied()
            .ok_or_else(|| LedgerError::reverted(RevertReason::UnknownEntity))
    }
}

#[async_trait]
impl LedgerWriter for InMemoryLedger {
    async fn create_atoms(
        &self,
        uris: &[ContentUri],
        costs: &[Amount],
    ) -> Result<WriteReceipt<AtomId>, LedgerError> {
        if uris.is_empty() || uris.len() != costs.len() {
            return Err(LedgerError::reverted(RevertReason::Other(
                "create_atoms arity mismatch".into(),
            )));
        }

        let mut state = self.write_state();

        // Validate the whole transaction before touching state.
        let mut ids = Vec::with_capacity(uris.len());
        let mut seen = HashSet::new();
        for uri in uris {
            let id = AtomId::derive(uri);
            if state.atoms.contains_key(&id) || !seen.insert(id) {
                // A collision proves the writer's view has caught up.
                state.lagging.remove(&EntityId::from(id));
                return Err(LedgerError::reverted(RevertReason::AtomExists));
            }
            ids.push(id);
        }
        let floor = state.atom_cost;
        Self::charge(&mut state, costs, floor)?;

        for (id, uri) in ids.iter().zip(uris) {
            state.atoms.insert(*id, uri.clone());
            state.lagging.remove(&EntityId::from(*id));
        }
        let raw: Vec<[u8; 32]> = ids.iter().map(|id| *id.as_bytes()).collect();
        let tx_hash = Self::seal_transaction(&mut state, &raw);

        Ok(WriteReceipt::new(ids, tx_hash))
    }

    async fn create_triples(
        &self,
        subjects: &[AtomId],
        predicates: &[AtomId],
        objects: &[AtomId],
        costs: &[Amount],
    ) -> Result<WriteReceipt<TripleId>, LedgerError> {
        let len = subjects.len();
        if len == 0 || predicates.len() != len || objects.len() != len || costs.len() != len {
            return Err(LedgerError::reverted(RevertReason::Other(
                "create_triples arity mismatch".into(),
            )));
        }

        let mut state = self.write_state();

        let mut ids = Vec::with_capacity(len);
        let mut seen = HashSet::new();
        for i in 0..len {
            for atom in [&subjects[i], &predicates[i], &objects[i]] {
                if !state.atoms.contains_key(atom) {
                    return Err(LedgerError::reverted(RevertReason::MissingAtom));
                }
            }
            let id = TripleId::derive(&subjects[i], &predicates[i], &objects[i]);
            if state.triples.contains_key(&id) || !seen.insert(id) {
                state.lagging.remove(&EntityId::from(id));
                return Err(LedgerError::reverted(RevertReason::TripleExists));
            }
            ids.push(id);
        }
        let floor = state.triple_cost;
        Self::charge(&mut state, costs, floor)?;

        for (i, id) in ids.iter().enumerate() {
            state
                .triples
                .insert(*id, (subjects[i], predicates[i], objects[i]));
            state.lagging.remove(&EntityId::from(*id));
        }
        let raw: Vec<[u8; 32]> = ids.iter().map(|id| *id.as_bytes()).collect();
        let tx_hash = Self::seal_transaction(&mut state, &raw);

        Ok(WriteReceipt::new(ids, tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(name: &str) -> ContentUri {
        ContentUri::new(format!("ipfs://bafy-{name}"))
    }

    async fn seed_atoms(ledger: &InMemoryLedger, names: &[&str]) -> Vec<AtomId> {
        let uris: Vec<ContentUri> = names.iter().map(|n| uri(n)).collect();
        let costs = vec![ledger.read_state().atom_cost; uris.len()];
        ledger.create_atoms(&uris, &costs).await.unwrap().ids
    }

    #[tokio::test]
    async fn atoms_are_unique_and_receipts_preserve_order() {
        let ledger = InMemoryLedger::default();
        let ids = seed_atoms(&ledger, &["a", "b", "c"]).await;

        assert_eq!(ids[0], AtomId::derive(&uri("a")));
        assert_eq!(ids[1], AtomId::derive(&uri("b")));
        assert_eq!(ids[2], AtomId::derive(&uri("c")));

        let error = ledger
            .create_atoms(&[uri("a")], &[Amount::new(100)])
            .await
            .unwrap_err();
        assert_eq!(error, LedgerError::reverted(RevertReason::AtomExists));
    }

    #[tokio::test]
    async fn rejected_batch_mutates_nothing() {
        let ledger = InMemoryLedger::default();
        seed_atoms(&ledger, &["dup"]).await;
        let balance_before = ledger.balance();

        // "fresh" is new, "dup" collides; the whole transaction must revert.
        let error = ledger
            .create_atoms(
                &[uri("fresh"), uri("dup")],
                &[Amount::new(100), Amount::new(100)],
            )
            .await
            .unwrap_err();

        assert_eq!(error, LedgerError::reverted(RevertReason::AtomExists));
        assert!(!ledger.contains_atom(AtomId::derive(&uri("fresh"))));
        assert_eq!(ledger.balance(), balance_before);
        assert_eq!(ledger.write_count(), 1);
    }

    #[tokio::test]
    async fn triple_creation_requires_existing_atoms() {
        let ledger = InMemoryLedger::default();
        let ids = seed_atoms(&ledger, &["s", "p"]).await;
        let ghost = AtomId::from_bytes([9; 32]);

        let error = ledger
            .create_triples(&[ids[0]], &[ids[1]], &[ghost], &[Amount::new(300)])
            .await
            .unwrap_err();
        assert_eq!(error, LedgerError::reverted(RevertReason::MissingAtom));
    }

    #[tokio::test]
    async fn duplicate_triple_reverts_whole_batch() {
        let ledger = InMemoryLedger::default();
        let ids = seed_atoms(&ledger, &["s", "p", "o1", "o2"]).await;

        ledger
            .create_triples(&[ids[0]], &[ids[1]], &[ids[2]], &[Amount::new(300)])
            .await
            .unwrap();

        let error = ledger
            .create_triples(
                &[ids[0], ids[0]],
                &[ids[1], ids[1]],
                &[ids[3], ids[2]],
                &[Amount::new(300), Amount::new(300)],
            )
            .await
            .unwrap_err();
        assert_eq!(error, LedgerError::reverted(RevertReason::TripleExists));
        assert!(!ledger.contains_triple(TripleId::derive(&ids[0], &ids[1], &ids[3])));
    }

    #[tokio::test]
    async fn creation_is_funded_from_the_balance() {
        let ledger = InMemoryLedger::new(Amount::new(100), Amount::new(300), Amount::new(150));
        ledger
            .create_atoms(&[uri("a")], &[Amount::new(100)])
            .await
            .unwrap();
        assert_eq!(ledger.balance(), Amount::new(50));

        let error = ledger
            .create_atoms(&[uri("b")], &[Amount::new(100)])
            .await
            .unwrap_err();
        assert_eq!(
            error,
            LedgerError::reverted(RevertReason::InsufficientFunds)
        );
    }

    #[tokio::test]
    async fn underpriced_items_are_rejected() {
        let ledger = InMemoryLedger::default();
        let error = ledger
            .create_atoms(&[uri("a")], &[Amount::new(1)])
            .await
            .unwrap_err();
        assert_eq!(
            error,
            LedgerError::reverted(RevertReason::InsufficientFunds)
        );
    }

    #[tokio::test]
    async fn concealed_entities_still_collide_on_create() {
        let ledger = InMemoryLedger::default();
        let ids = seed_atoms(&ledger, &["race"]).await;
        ledger.conceal_from_reads(EntityId::from(ids[0]));

        assert!(!ledger
            .is_entity_created(EntityId::from(ids[0]))
            .await
            .unwrap());

        let error = ledger
            .create_atoms(&[uri("race")], &[Amount::new(100)])
            .await
            .unwrap_err();
        assert_eq!(error, LedgerError::reverted(RevertReason::AtomExists));

        // The collision catches the lagging view up.
        assert!(ledger
            .is_entity_created(EntityId::from(ids[0]))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn injected_read_faults_are_transient_and_bounded() {
        let ledger = InMemoryLedger::default();
        ledger.fail_next_reads(1);

        let error = ledger
            .is_entity_created(EntityId::from_bytes([1; 32]))
            .await
            .unwrap_err();
        assert!(error.is_transient());

        assert!(!ledger
            .is_entity_created(EntityId::from_bytes([1; 32]))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn triple_lookup_reverts_when_absent() {
        let ledger = InMemoryLedger::default();
        let error = ledger
            .triple(TripleId::from_bytes([4; 32]))
            .await
            .unwrap_err();
        assert_eq!(error, LedgerError::reverted(RevertReason::UnknownEntity));
    }
}
