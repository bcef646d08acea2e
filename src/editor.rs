//! In-progress card state behind the editor form.
//!
//! A [`CardDraft`] is an immutable snapshot: every edit returns a new draft
//! and the preview is derived from whichever snapshot is current.

use chrono::{Datelike, Local, NaiveDate};
use rand::Rng;
use validator::{Validate, ValidationErrors};

use crate::data_uri;
use crate::imaging;
use crate::models::{Card, CardPatch, NewCard};
use crate::render::{render_preview, CardLayout, DimensionPreset, Theme};
use crate::validation::{field_violations, FieldViolation};

pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("photo is {0} bytes, the limit is 2MB")]
    PhotoTooLarge(usize),
}

/// `OTK-<year>-<5 digits>`.
pub fn generate_card_number<R: Rng + ?Sized>(rng: &mut R, year: i32) -> String {
    format!("OTK-{}-{:05}", year, rng.gen_range(10000..100000))
}

/// `DD/MM/YYYY`.
pub fn format_issue_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Username(String),
    RealName(String),
    Nationality(String),
    Status(String),
    Genre(String),
    Quote(String),
    QrCodeEnabled(bool),
    QrCodeLink(String),
    ClearPhoto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardDraft {
    id: Option<i32>,
    card: NewCard,
}

impl CardDraft {
    pub fn new() -> Self {
        Self::new_on(Local::now().date_naive(), &mut rand::thread_rng())
    }

    pub fn new_on<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Self {
        Self {
            id: None,
            card: NewCard {
                status: "Otaku".to_string(),
                genre: "Shonen".to_string(),
                qr_code_enabled: false,
                qr_code_link: Some(String::new()),
                card_number: Some(generate_card_number(rng, today.year())),
                issue_date: Some(format_issue_date(today)),
                ..Default::default()
            },
        }
    }

    /// Load a saved card for editing.
    pub fn from_card(card: Card) -> Self {
        Self {
            id: Some(card.id),
            card: card.into(),
        }
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn card(&self) -> &NewCard {
        &self.card
    }

    pub fn apply(&self, edit: Edit) -> Self {
        let mut next = self.clone();
        let card = &mut next.card;
        match edit {
            Edit::Username(v) => card.username = v,
            Edit::RealName(v) => card.real_name = v,
            Edit::Nationality(v) => card.nationality = v,
            Edit::Status(v) => card.status = v,
            Edit::Genre(v) => card.genre = v,
            Edit::Quote(v) => card.quote = v,
            Edit::QrCodeEnabled(v) => card.qr_code_enabled = v,
            Edit::QrCodeLink(v) => card.qr_code_link = Some(v),
            Edit::ClearPhoto => card.photo = None,
        }
        next
    }

    /// Attach a photo, cropped to passport format. An image that cannot be
    /// cropped is kept as uploaded.
    pub fn with_photo(&self, bytes: &[u8], mime: &str) -> Result<Self, EditorError> {
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(EditorError::PhotoTooLarge(bytes.len()));
        }
        let photo = match imaging::crop_to_passport(bytes) {
            Ok(jpeg) => data_uri::encode("image/jpeg", &jpeg),
            Err(err) => {
                tracing::warn!(error = %err, "photo crop failed, keeping original image");
                data_uri::encode(mime, bytes)
            }
        };
        let mut next = self.clone();
        next.card.photo = Some(photo);
        Ok(next)
    }

    /// Inline feedback for the form, one entry per violated rule.
    pub fn field_errors(&self) -> Vec<FieldViolation> {
        match self.card.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => field_violations(&errors),
        }
    }

    /// Payload for `POST /api/cards`.
    pub fn to_new_card(&self) -> Result<NewCard, ValidationErrors> {
        self.card.validate()?;
        Ok(self.card.clone())
    }

    /// Payload for `PUT /api/cards/:id`: every field, so the stored card
    /// ends up equal to the draft. Unset optional strings are sent as `""`
    /// because an absent field leaves the stored value alone.
    pub fn to_patch(&self) -> Result<CardPatch, ValidationErrors> {
        let card = self.to_new_card()?;
        Ok(CardPatch {
            username: Some(card.username),
            real_name: Some(card.real_name),
            nationality: Some(card.nationality),
            status: Some(card.status),
            genre: Some(card.genre),
            quote: Some(card.quote),
            photo: Some(card.photo.unwrap_or_default()),
            qr_code_enabled: Some(card.qr_code_enabled),
            qr_code_link: Some(card.qr_code_link.unwrap_or_default()),
            card_number: Some(card.card_number.unwrap_or_default()),
            issue_date: Some(card.issue_date.unwrap_or_default()),
        })
    }

    pub fn preview(&self, theme: &Theme, preset: DimensionPreset) -> CardLayout {
        render_preview(&self.card, theme, preset)
    }
}

impl Default for CardDraft {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::render::preview::{PhotoContent, TextRole};
    use crate::store::{CardStore, MemoryCardStore};
    use rand::{rngs::StdRng, SeedableRng};

    fn draft() -> CardDraft {
        let today = NaiveDate::from_ymd_opt(2025, 4, 28).unwrap();
        CardDraft::new_on(today, &mut StdRng::seed_from_u64(7))
    }

    fn filled() -> CardDraft {
        draft()
            .apply(Edit::Username("KawaiiSenpai".into()))
            .apply(Edit::RealName("Jean Dupont".into()))
            .apply(Edit::Nationality("fr".into()))
            .apply(Edit::Quote("Omae wa mou shindeiru".into()))
    }

    #[test]
    fn test_defaults() {
        let d = draft();
        assert_eq!(d.card().status, "Otaku");
        assert_eq!(d.card().genre, "Shonen");
        assert!(!d.card().qr_code_enabled);
        assert_eq!(d.card().issue_date.as_deref(), Some("28/04/2025"));

        let number = d.card().card_number.clone().unwrap();
        assert!(number.starts_with("OTK-2025-"), "{}", number);
        let digits = &number["OTK-2025-".len()..];
        assert_eq!(digits.len(), 5);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_edits_produce_new_snapshots() {
        let first = draft();
        let second = first.apply(Edit::Username("KawaiiSenpai".into()));
        assert_eq!(first.card().username, "");
        assert_eq!(second.card().username, "KawaiiSenpai");

        let layout = second.preview(&Theme::classic(), DimensionPreset::Standard);
        assert_eq!(layout.scene.text(TextRole::Username), Some("NOM: KawaiiSenpai"));
    }

    #[test]
    fn test_field_errors_for_blank_draft() {
        let fields: Vec<String> = draft().field_errors().into_iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["nationality", "quote", "realName", "username"]);
        assert!(filled().field_errors().is_empty());
        assert!(draft().to_new_card().is_err());
        assert!(filled().to_new_card().is_ok());
    }

    #[test]
    fn test_bad_link_is_reported_inline() {
        let d = filled()
            .apply(Edit::QrCodeEnabled(true))
            .apply(Edit::QrCodeLink("not-a-url".into()));
        let errors = d.field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "qrCodeLink");
    }

    #[test]
    fn test_photo_is_cropped() {
        let img = image::RgbImage::from_pixel(200, 100, image::Rgb([10, 20, 30]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let d = filled().with_photo(&png, "image/png").unwrap();
        let photo = d.card().photo.clone().unwrap();
        assert!(photo.starts_with("data:image/jpeg;base64,"));
        assert!(d.field_errors().is_empty());

        let cleared = d.apply(Edit::ClearPhoto);
        assert!(cleared.card().photo.is_none());
    }

    #[test]
    fn test_undecodable_photo_kept_as_is() {
        let d = filled().with_photo(b"GIF89a-broken", "image/gif").unwrap();
        assert!(d.card().photo.as_deref().unwrap().starts_with("data:image/gif;base64,"));
    }

    #[test]
    fn test_photo_size_limit() {
        let big = vec![0u8; MAX_PHOTO_BYTES + 1];
        assert_eq!(
            filled().with_photo(&big, "image/png"),
            Err(EditorError::PhotoTooLarge(MAX_PHOTO_BYTES + 1))
        );
    }

    #[test]
    fn test_round_trip_through_saved_card() {
        let saved = Card::from_new(12, filled().to_new_card().unwrap());
        let d = CardDraft::from_card(saved.clone());
        assert_eq!(d.id(), Some(12));

        let mut merged = saved.clone();
        merged.apply(d.to_patch().unwrap());
        assert_eq!(merged.username, saved.username);
        assert_eq!(merged.quote, saved.quote);
        assert_eq!(merged.photo.unwrap_or_default(), "");
    }

    #[tokio::test]
    async fn test_cleared_photo_is_removed_from_store() {
        let store = MemoryCardStore::new();
        let mut card = filled().to_new_card().unwrap();
        card.photo = Some(crate::data_uri::encode("image/jpeg", &[0xff, 0xd8, 0xff]));
        let saved = store.create(card).await.unwrap();

        let d = CardDraft::from_card(saved.clone()).apply(Edit::ClearPhoto);
        let stored = store.update(saved.id, d.to_patch().unwrap()).await.unwrap().unwrap();

        assert_eq!(stored.photo.as_deref(), Some(""));
        let layout = render_preview(&NewCard::from(stored), &Theme::classic(), DimensionPreset::Standard);
        assert_eq!(layout.scene.photo(), Some(&PhotoContent::Placeholder));
    }

    #[tokio::test]
    async fn test_cleared_link_is_removed_from_store() {
        let store = MemoryCardStore::new();
        let mut card = filled().to_new_card().unwrap();
        card.qr_code_enabled = true;
        card.qr_code_link = Some("https://anilist.co".to_string());
        let saved = store.create(card).await.unwrap();

        let d = CardDraft::from_card(saved.clone()).apply(Edit::QrCodeLink(String::new()));
        let stored = store.update(saved.id, d.to_patch().unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.qr_code_link.as_deref(), Some(""));
    }
}
