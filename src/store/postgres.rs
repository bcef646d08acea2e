use sqlx::PgPool;

use super::{CardStore, StoreResult};
use crate::models::{Card, CardPatch, NewCard};

const CARD_COLUMNS: &str = "id, username, real_name, nationality, status, genre, quote, photo, \
     qr_code_enabled, qr_code_link, card_number, issue_date";

/// PostgreSQL implementation of [`CardStore`].
#[derive(Clone)]
pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CardStore for PgCardStore {
    async fn get_by_id(&self, id: i32) -> StoreResult<Option<Card>> {
        let card = sqlx::query_as::<_, Card>(&format!(
            "SELECT {} FROM id_cards WHERE id = $1",
            CARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    async fn get_all(&self) -> StoreResult<Vec<Card>> {
        let cards = sqlx::query_as::<_, Card>(&format!(
            "SELECT {} FROM id_cards ORDER BY id",
            CARD_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    async fn create(&self, card: NewCard) -> StoreResult<Card> {
        let query = format!(
            r#"
            INSERT INTO id_cards (username, real_name, nationality, status, genre, quote,
                                  photo, qr_code_enabled, qr_code_link, card_number, issue_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            CARD_COLUMNS
        );

        let created = sqlx::query_as::<_, Card>(&query)
            .bind(card.username)
            .bind(card.real_name)
            .bind(card.nationality)
            .bind(card.status)
            .bind(card.genre)
            .bind(card.quote)
            .bind(card.photo)
            .bind(card.qr_code_enabled)
            .bind(card.qr_code_link)
            .bind(card.card_number)
            .bind(card.issue_date)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(id = created.id, "created card");
        Ok(created)
    }

    async fn update(&self, id: i32, patch: CardPatch) -> StoreResult<Option<Card>> {
        // NULL parameters leave the column untouched.
        let query = format!(
            r#"
            UPDATE id_cards SET
                username = COALESCE($2, username),
                real_name = COALESCE($3, real_name),
                nationality = COALESCE($4, nationality),
                status = COALESCE($5, status),
                genre = COALESCE($6, genre),
                quote = COALESCE($7, quote),
                photo = COALESCE($8, photo),
                qr_code_enabled = COALESCE($9, qr_code_enabled),
                qr_code_link = COALESCE($10, qr_code_link),
                card_number = COALESCE($11, card_number),
                issue_date = COALESCE($12, issue_date)
            WHERE id = $1
            RETURNING {}
            "#,
            CARD_COLUMNS
        );

        let updated = sqlx::query_as::<_, Card>(&query)
            .bind(id)
            .bind(patch.username)
            .bind(patch.real_name)
            .bind(patch.nationality)
            .bind(patch.status)
            .bind(patch.genre)
            .bind(patch.quote)
            .bind(patch.photo)
            .bind(patch.qr_code_enabled)
            .bind(patch.qr_code_link)
            .bind(patch.card_number)
            .bind(patch.issue_date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM id_cards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
