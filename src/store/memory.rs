use std::sync::atomic::{AtomicI32, Ordering};

use dashmap::DashMap;

use super::{CardStore, StoreError, StoreResult};
use crate::models::{Card, CardPatch, NewCard};

/// In-process [`CardStore`] used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryCardStore {
    cards: DashMap<i32, Card>,
    last_id: AtomicI32,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn next_id(&self) -> StoreResult<i32> {
        self.last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map(|prev| prev + 1)
            .map_err(|_| StoreError::IdsExhausted)
    }
}

#[async_trait::async_trait]
impl CardStore for MemoryCardStore {
    async fn get_by_id(&self, id: i32) -> StoreResult<Option<Card>> {
        Ok(self.cards.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_all(&self) -> StoreResult<Vec<Card>> {
        let mut cards: Vec<Card> = self.cards.iter().map(|e| e.value().clone()).collect();
        cards.sort_by_key(|c| c.id);
        Ok(cards)
    }

    async fn create(&self, card: NewCard) -> StoreResult<Card> {
        let id = self.next_id()?;
        let card = Card::from_new(id, card);
        self.cards.insert(id, card.clone());
        tracing::info!(id, "created card");
        Ok(card)
    }

    async fn update(&self, id: i32, patch: CardPatch) -> StoreResult<Option<Card>> {
        Ok(self.cards.get_mut(&id).map(|mut entry| {
            entry.apply(patch);
            entry.clone()
        }))
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        Ok(self.cards.remove(&id).is_some())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
