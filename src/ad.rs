//! Core ad entity and its draft builder
use super::error::AdValidationError;
use super::utils;
use chrono::{DateTime, TimeZone, Utc};
use std::str::FromStr;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Eq, Ord, PartialEq, PartialOrd, Clone, Copy)]
pub enum Category {
    #[n(0)]
    Books,
    #[n(1)]
    Electronics,
    #[n(2)]
    Clothes,
    #[n(3)]
    Furniture,
    #[n(4)]
    Toys,
    #[n(5)]
    Other,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Eq, Ord, PartialEq, PartialOrd, Clone, Copy)]
pub enum Condition {
    #[n(0)]
    New,
    #[n(1)]
    Used,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Books => "books",
            Category::Electronics => "electronics",
            Category::Clothes => "clothes",
            Category::Furniture => "furniture",
            Category::Toys => "toys",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = AdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "books" => Ok(Category::Books),
            "electronics" => Ok(Category::Electronics),
            "clothes" => Ok(Category::Clothes),
            "furniture" => Ok(Category::Furniture),
            "toys" => Ok(Category::Toys),
            "other" => Ok(Category::Other),
            unknown => Err(AdValidationError::UnknownCategory(unknown.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::Used => "used",
        }
    }
}

impl FromStr for Condition {
    type Err = AdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Condition::New),
            "used" => Ok(Condition::Used),
            unknown => Err(AdValidationError::UnknownCondition(unknown.to_string())),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> PartialEq for TimeStamp<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: TimeZone> Eq for TimeStamp<T> {}

impl<T: TimeZone> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// An item listed for exchange. Keyed in storage by `id`.
///
/// `is_exchanged` flips to true only when a proposal touching this ad is
/// accepted; an exchanged ad can no longer take part in new proposals.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Eq, PartialEq, Clone)]
pub struct Ad {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7, `ad_` prefix
    #[n(1)]
    pub owner: String, // user id, immutable after creation
    #[n(2)]
    pub title: String,
    #[n(3)]
    pub description: String,
    #[n(4)]
    pub image_url: Option<String>,
    #[n(5)]
    pub category: Category,
    #[n(6)]
    pub condition: Condition,
    #[n(7)]
    pub is_exchanged: bool,
    #[n(8)]
    pub created_at: TimeStamp<Utc>,
}

/// Draft for constructing or editing an [`Ad`].
#[derive(Debug, Default, Clone)]
pub struct AdDraft {
    title: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    category: Option<Category>,
    condition: Option<Condition>,
}

impl AdDraft {
    /// Construct a new draft, the basis for an ad
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
    pub fn set_image_url(mut self, url: &str) -> Self {
        self.image_url = Some(url.to_string());
        self
    }
    pub fn set_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
    pub fn set_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Checks required fields, then mints a fresh ad owned by `owner`.
    pub fn build(self, owner: &str) -> Result<Ad, AdValidationError> {
        let (title, description, image_url, category, condition) = self.validate()?;

        Ok(Ad {
            id: utils::mint_id(utils::AD_HRP),
            owner: owner.to_string(),
            title,
            description,
            image_url,
            category,
            condition,
            is_exchanged: false,
            created_at: TimeStamp::new(),
        })
    }

    /// Applies the draft to an existing ad. Identity, ownership, exchange
    /// flag and creation time are not editable.
    pub fn apply_to(self, ad: &Ad) -> Result<Ad, AdValidationError> {
        let (title, description, image_url, category, condition) = self.validate()?;

        Ok(Ad {
            id: ad.id.clone(),
            owner: ad.owner.clone(),
            title,
            description,
            image_url,
            category,
            condition,
            is_exchanged: ad.is_exchanged,
            created_at: ad.created_at.clone(),
        })
    }

    fn validate(
        self,
    ) -> Result<(String, String, Option<String>, Category, Condition), AdValidationError> {
        let title = match self.title {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(AdValidationError::MissingTitle),
        };
        let category = self.category.ok_or(AdValidationError::MissingCategory)?;
        let condition = self.condition.ok_or(AdValidationError::MissingCondition)?;

        Ok((
            title,
            self.description.unwrap_or_default(),
            self.image_url,
            category,
            condition,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_builds_with_required_fields() {
        let ad = AdDraft::new()
            .set_title("Desk")
            .set_description("Wooden, a few scratches.")
            .set_category(Category::Furniture)
            .set_condition(Condition::Used)
            .build("user_abc")
            .unwrap();

        assert!(ad.id.starts_with("ad_1"));
        assert_eq!(ad.owner, "user_abc");
        assert!(!ad.is_exchanged);
        assert_eq!(ad.image_url, None);
    }

    #[test]
    fn draft_rejects_blank_title() {
        let draft = AdDraft::new()
            .set_title("   ")
            .set_category(Category::Books)
            .set_condition(Condition::New);

        assert_eq!(
            draft.build("user_abc").unwrap_err(),
            AdValidationError::MissingTitle
        );
    }

    #[test]
    fn draft_rejects_missing_category() {
        let draft = AdDraft::new().set_title("Lamp").set_condition(Condition::New);

        assert_eq!(
            draft.build("user_abc").unwrap_err(),
            AdValidationError::MissingCategory
        );
    }

    #[test]
    fn apply_to_keeps_identity_and_exchange_flag() {
        let ad = AdDraft::new()
            .set_title("Lamp")
            .set_category(Category::Electronics)
            .set_condition(Condition::New)
            .build("user_abc")
            .unwrap();
        let mut exchanged = ad.clone();
        exchanged.is_exchanged = true;

        let edited = AdDraft::new()
            .set_title("LED lamp")
            .set_description("Barely used")
            .set_category(Category::Electronics)
            .set_condition(Condition::Used)
            .apply_to(&exchanged)
            .unwrap();

        assert_eq!(edited.id, ad.id);
        assert_eq!(edited.owner, ad.owner);
        assert!(edited.is_exchanged);
        assert_eq!(edited.title, "LED lamp");
    }

    #[test]
    fn category_parses_known_slugs() {
        assert_eq!("furniture".parse::<Category>().unwrap(), Category::Furniture);
        assert_eq!("used".parse::<Condition>().unwrap(), Condition::Used);
        assert!(matches!(
            "unknown_condition".parse::<Condition>(),
            Err(AdValidationError::UnknownCondition(_))
        ));
    }

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }
}
