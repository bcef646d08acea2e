mod memory;
mod postgres;

pub use memory::MemoryCardStore;
pub use postgres::PgCardStore;

use crate::models::{Card, CardPatch, NewCard};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Card id sequence exhausted")]
    IdsExhausted,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CRUD over the `id_cards` table, keyed by `id`.
///
/// "Not found" is never an error: lookups return `None` and deletes return
/// `false`.
#[async_trait::async_trait]
pub trait CardStore: Send + Sync {
    async fn get_by_id(&self, id: i32) -> StoreResult<Option<Card>>;

    /// Every card, ordered by id.
    async fn get_all(&self) -> StoreResult<Vec<Card>>;

    async fn create(&self, card: NewCard) -> StoreResult<Card>;

    async fn update(&self, id: i32, patch: CardPatch) -> StoreResult<Option<Card>>;

    /// `true` when a row was actually removed.
    async fn delete(&self, id: i32) -> StoreResult<bool>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
