//! [`Property`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Property listed for rent or sale.
#[derive(Clone, Debug)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// [`Title`] of this [`Property`].
    pub title: Title,

    /// [`Description`] of this [`Property`].
    pub description: Description,

    /// [`Price`] this [`Property`] is listed for.
    pub price: Price,

    /// [`Kind`] of this [`Property`].
    pub kind: Kind,

    /// [`ListingKind`] of this [`Property`].
    pub listing: ListingKind,

    /// Number of bedrooms in this [`Property`].
    pub bedrooms: Rooms,

    /// Number of bathrooms in this [`Property`].
    pub bathrooms: Rooms,

    /// [`Area`] of this [`Property`].
    pub area: Area,

    /// [`Address`] of this [`Property`].
    pub address: Address,

    /// [`City`] this [`Property`] is located in.
    pub city: City,

    /// [`State`] this [`Property`] is located in.
    pub state: State,

    /// [`Image`]s of this [`Property`], in display order.
    pub images: Vec<Image>,

    /// Indicator whether this [`Property`] is featured.
    pub featured: bool,

    /// ID of the user owning this [`Property`].
    pub owner_id: OwnerId,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Property`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Property {
    /// Returns the first non-empty [`Image`] of this [`Property`], if any.
    #[must_use]
    pub fn cover_image(&self) -> Option<&Image> {
        self.images
            .iter()
            .find(|i| !AsRef::<str>::as_ref(i).trim().is_empty())
    }
}

/// ID of a [`Property`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[expect(clippy::new_without_default, reason = "nil `Id` is not valid")]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// ID of a user owning a [`Property`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct OwnerId(Uuid);

/// Title of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title && !title.is_empty() && title.len() <= 256
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

/// Free-form description of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid.
    ///
    /// Empty descriptions are allowed.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (text.len() <= 10_000).then_some(Self(text))
    }
}

/// Street address of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Address`].
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        address.trim() == address && !address.is_empty() && address.len() <= 512
    }
}

/// City of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct City(String);

impl City {
    /// Creates a new [`City`] if the given `city` is valid.
    #[must_use]
    pub fn new(city: impl Into<String>) -> Option<Self> {
        let city = city.into();
        Self::check(&city).then_some(Self(city))
    }

    /// Checks whether the given `city` is a valid [`City`].
    fn check(city: impl AsRef<str>) -> bool {
        let city = city.as_ref();
        city.trim() == city && !city.is_empty() && city.len() <= 128
    }
}

impl FromStr for City {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `City`")
    }
}

/// State of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct State(String);

impl State {
    /// Creates a new [`State`] if the given `state` is valid.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Option<Self> {
        let state = state.into();
        Self::check(&state).then_some(Self(state))
    }

    /// Checks whether the given `state` is a valid [`State`].
    fn check(state: impl AsRef<str>) -> bool {
        let state = state.as_ref();
        state.trim() == state && !state.is_empty() && state.len() <= 128
    }
}

impl FromStr for State {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `State`")
    }
}

/// URL of a [`Property`] image.
///
/// Stored as is: images may come empty from legacy listings.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
#[serde(transparent)]
pub struct Image(String);

impl Image {
    /// Creates a new [`Image`] out of the given `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }
}

/// Price of a [`Property`].
pub type Price = Decimal;

/// Area of a [`Property`], in square feet.
pub type Area = Decimal;

/// Number of rooms of some kind in a [`Property`].
pub type Rooms = u16;

define_kind! {
    #[doc = "Kind of a [`Property`]."]
    enum Kind {
        #[doc = "An apartment in a building."]
        Apartment = 1,

        #[doc = "A standalone house."]
        House = 2,

        #[doc = "A villa."]
        Villa = 3,

        #[doc = "A plot of land."]
        Plot = 4,

        #[doc = "A commercial space."]
        Commercial = 5,
    }
}

define_kind! {
    #[doc = "Kind of a [`Property`] listing."]
    enum ListingKind {
        #[doc = "Listed for sale."]
        Sale = 1,

        #[doc = "Listed for rent."]
        Rent = 2,
    }
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when a [`Property`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Property, unit::Modification)>;

#[cfg(test)]
mod spec {
    use super::{City, Id, Kind, ListingKind, State, Title};

    #[test]
    fn validates_text() {
        assert!(Title::new("Sea view villa").is_some());
        assert!(Title::new(" padded").is_none());
        assert!(Title::new("").is_none());
        assert!(City::new("Mumbai").is_some());
        assert!(City::new("x".repeat(129)).is_none());
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("villa".parse::<Kind>().unwrap(), Kind::Villa);
        assert_eq!("RENT".parse::<ListingKind>().unwrap(), ListingKind::Rent);
        assert_eq!(Kind::Commercial.to_string(), "Commercial");
        assert!("castle".parse::<Kind>().is_err());
    }

    #[test]
    fn parses_text_from_str() {
        assert_eq!("Sea view".parse::<Title>().unwrap(), Title::new("Sea view").unwrap());
        assert!(" Pune".parse::<City>().is_err());
        assert!("".parse::<State>().is_err());
    }

    #[test]
    fn new_ids_are_random() {
        let id = Id::new();
        assert_ne!(id, Id::new());
        assert_ne!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }
}
