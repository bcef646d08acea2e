use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::validation::{validate_link, validate_nationality, validate_photo, validate_required};

/// A card row from `id_cards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i32,
    pub username: String,
    pub real_name: String,
    pub nationality: String,
    pub status: String,
    pub genre: String,
    pub quote: String,
    pub photo: Option<String>,
    pub qr_code_enabled: bool,
    pub qr_code_link: Option<String>,
    pub card_number: Option<String>,
    pub issue_date: Option<String>,
}

impl Card {
    pub fn from_new(id: i32, card: NewCard) -> Self {
        Self {
            id,
            username: card.username,
            real_name: card.real_name,
            nationality: card.nationality,
            status: card.status,
            genre: card.genre,
            quote: card.quote,
            photo: card.photo,
            qr_code_enabled: card.qr_code_enabled,
            qr_code_link: card.qr_code_link,
            card_number: card.card_number,
            issue_date: card.issue_date,
        }
    }

    /// Merge the fields carried by `patch`; omitted fields stay as they are.
    pub fn apply(&mut self, patch: CardPatch) {
        if let Some(v) = patch.username {
            self.username = v;
        }
        if let Some(v) = patch.real_name {
            self.real_name = v;
        }
        if let Some(v) = patch.nationality {
            self.nationality = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.genre {
            self.genre = v;
        }
        if let Some(v) = patch.quote {
            self.quote = v;
        }
        if patch.photo.is_some() {
            self.photo = patch.photo;
        }
        if let Some(v) = patch.qr_code_enabled {
            self.qr_code_enabled = v;
        }
        if patch.qr_code_link.is_some() {
            self.qr_code_link = patch.qr_code_link;
        }
        if patch.card_number.is_some() {
            self.card_number = patch.card_number;
        }
        if patch.issue_date.is_some() {
            self.issue_date = patch.issue_date;
        }
    }
}

/// Writable card fields. `id` is server-assigned and never read from input.
///
/// Required strings default to empty so a missing field is reported by
/// validation instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    #[serde(default)]
    #[validate(
        custom(function = "validate_required"),
        length(max = 50, message = "must be at most 50 characters")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(
        custom(function = "validate_required"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub real_name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_nationality"))]
    pub nationality: String,

    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub status: String,

    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub genre: String,

    #[serde(default)]
    #[validate(
        custom(function = "validate_required"),
        length(max = 500, message = "must be at most 500 characters")
    )]
    pub quote: String,

    #[validate(custom(function = "validate_photo"))]
    pub photo: Option<String>,

    #[serde(default)]
    pub qr_code_enabled: bool,

    #[validate(custom(function = "validate_link"))]
    pub qr_code_link: Option<String>,

    pub card_number: Option<String>,

    pub issue_date: Option<String>,
}

impl From<Card> for NewCard {
    fn from(card: Card) -> Self {
        Self {
            username: card.username,
            real_name: card.real_name,
            nationality: card.nationality,
            status: card.status,
            genre: card.genre,
            quote: card.quote,
            photo: card.photo,
            qr_code_enabled: card.qr_code_enabled,
            qr_code_link: card.qr_code_link,
            card_number: card.card_number,
            issue_date: card.issue_date,
        }
    }
}

/// Body of `POST /api/validate-card`: the writable fields plus an optional
/// client-side id that is echoed back untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(flatten)]
    pub card: NewCard,
}

/// Partial update. Every field is optional and only present fields are
/// validated and written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[validate(
        custom(function = "validate_required"),
        length(max = 50, message = "must be at most 50 characters")
    )]
    pub username: Option<String>,

    #[validate(
        custom(function = "validate_required"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub real_name: Option<String>,

    #[validate(custom(function = "validate_nationality"))]
    pub nationality: Option<String>,

    #[validate(custom(function = "validate_required"))]
    pub status: Option<String>,

    #[validate(custom(function = "validate_required"))]
    pub genre: Option<String>,

    #[validate(
        custom(function = "validate_required"),
        length(max = 500, message = "must be at most 500 characters")
    )]
    pub quote: Option<String>,

    #[validate(custom(function = "validate_photo"))]
    pub photo: Option<String>,

    pub qr_code_enabled: Option<bool>,

    #[validate(custom(function = "validate_link"))]
    pub qr_code_link: Option<String>,

    pub card_number: Option<String>,

    pub issue_date: Option<String>,
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        *self == CardPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> NewCard {
        serde_json::from_value(json!({
            "username": "KawaiiSenpai",
            "realName": "Jean Dupont",
            "nationality": "fr",
            "status": "Otaku",
            "genre": "Shonen",
            "quote": "Omae wa mou shindeiru",
            "qrCodeEnabled": false
        }))
        .unwrap()
    }

    #[test]
    fn test_new_card_reads_camel_case_and_defaults() {
        let card: NewCard = serde_json::from_value(json!({
            "username": "KawaiiSenpai",
            "realName": "Jean Dupont",
            "nationality": "fr",
            "status": "Otaku",
            "genre": "Shonen",
            "quote": "Omae wa mou shindeiru"
        }))
        .unwrap();

        assert_eq!(card.real_name, "Jean Dupont");
        assert!(!card.qr_code_enabled);
        assert!(card.photo.is_none());
        assert!(card.validate().is_ok());
    }

    #[test]
    fn test_id_in_body_is_ignored() {
        let card: NewCard = serde_json::from_value(json!({
            "id": 99,
            "username": "a",
        }))
        .unwrap();
        assert_eq!(card.username, "a");
    }

    #[test]
    fn test_submission_keeps_id() {
        let sub: CardSubmission = serde_json::from_value(json!({
            "id": 7,
            "username": "KawaiiSenpai",
            "qrCodeEnabled": true
        }))
        .unwrap();
        assert_eq!(sub.id, Some(7));
        assert!(sub.card.qr_code_enabled);

        let back = serde_json::to_value(&sub).unwrap();
        assert_eq!(back["id"], 7);
        assert_eq!(back["username"], "KawaiiSenpai");
    }

    #[test]
    fn test_apply_merges_only_present_fields() {
        let mut card = Card::from_new(1, sample());
        card.apply(CardPatch {
            quote: Some("Plus Ultra".to_string()),
            qr_code_enabled: Some(true),
            ..Default::default()
        });

        assert_eq!(card.quote, "Plus Ultra");
        assert!(card.qr_code_enabled);
        assert_eq!(card.username, "KawaiiSenpai");
        assert_eq!(card.nationality, "fr");
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut card = Card::from_new(3, sample());
        let before = card.clone();
        let patch = CardPatch::default();
        assert!(patch.is_empty());
        card.apply(patch);
        assert_eq!(card, before);
    }

    #[test]
    fn test_patch_validates_present_fields_only() {
        let patch: CardPatch = serde_json::from_value(json!({ "quote": "" })).unwrap();
        assert!(patch.validate().is_err());

        let patch: CardPatch = serde_json::from_value(json!({ "genre": "Isekai" })).unwrap();
        assert!(patch.validate().is_ok());
    }
}
