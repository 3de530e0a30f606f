//! [`Property`]-related read definitions.

pub mod list;

use std::{cmp::Ordering, fmt, iter, str::FromStr as _};

use common::DateTime;
use rust_decimal::{prelude::ToPrimitive as _, Decimal};
use serde::{ser::SerializeMap as _, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};
use uuid::Uuid;

use crate::domain::{property, Property};

/// Field of a [`Property`] exposed to clients, named as on the wire.
#[derive(
    Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, PartialEq,
)]
#[strum(serialize_all = "camelCase")]
pub enum Field {
    /// [`Property::id`].
    Id,

    /// [`Property::title`].
    Title,

    /// [`Property::description`].
    Description,

    /// [`Property::price`].
    Price,

    /// [`Property::kind`].
    PropertyType,

    /// [`Property::listing`].
    ListingType,

    /// [`Property::bedrooms`].
    Bedrooms,

    /// [`Property::bathrooms`].
    Bathrooms,

    /// [`Property::area`].
    Area,

    /// [`Property::address`].
    Address,

    /// [`Property::city`].
    City,

    /// [`Property::state`].
    State,

    /// [`Property::images`].
    Images,

    /// [`Property::featured`].
    Featured,

    /// [`Property::owner_id`].
    Owner,

    /// [`Property::created_at`].
    CreatedAt,

    /// [`Property::updated_at`].
    UpdatedAt,
}

impl Field {
    /// Fields the free-text search is performed over.
    pub const SEARCHABLE: [Self; 4] =
        [Self::Title, Self::City, Self::State, Self::Description];

    /// Parses a [`Field`] by its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }

    /// Returns [`FieldKind`] of this [`Field`].
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Id | Self::Owner => FieldKind::Id,
            Self::Title
            | Self::Description
            | Self::Address
            | Self::City
            | Self::State => FieldKind::Text,
            Self::Price | Self::Bedrooms | Self::Bathrooms | Self::Area => {
                FieldKind::Number
            }
            Self::PropertyType => FieldKind::PropertyKind,
            Self::ListingType => FieldKind::ListingKind,
            Self::Featured => FieldKind::Bool,
            Self::CreatedAt | Self::UpdatedAt => FieldKind::DateTime,
            Self::Images => FieldKind::List,
        }
    }

    /// Indicates whether this [`Field`] can be filtered and sorted by.
    #[must_use]
    pub const fn is_comparable(self) -> bool {
        !matches!(self.kind(), FieldKind::List)
    }

    /// Returns the [`Value`] of this [`Field`] in the provided [`Property`].
    ///
    /// [`None`] is returned for non-[comparable] fields.
    ///
    /// [comparable]: Field::is_comparable
    #[must_use]
    pub fn value(self, p: &Property) -> Option<Value> {
        Some(match self {
            Self::Id => Value::Id(p.id.into()),
            Self::Owner => Value::Id(p.owner_id.into()),
            Self::Title => Value::Text(p.title.to_string()),
            Self::Description => Value::Text(p.description.to_string()),
            Self::Address => Value::Text(p.address.to_string()),
            Self::City => Value::Text(p.city.to_string()),
            Self::State => Value::Text(p.state.to_string()),
            Self::Price => Value::Number(p.price),
            Self::Area => Value::Number(p.area),
            Self::Bedrooms => Value::Number(p.bedrooms.into()),
            Self::Bathrooms => Value::Number(p.bathrooms.into()),
            Self::PropertyType => Value::PropertyKind(p.kind),
            Self::ListingType => Value::ListingKind(p.listing),
            Self::Featured => Value::Bool(p.featured),
            Self::CreatedAt => Value::DateTime(p.created_at.coerce()),
            Self::UpdatedAt => Value::DateTime(p.updated_at.coerce()),
            Self::Images => return None,
        })
    }
}

/// Type of values a [`Field`] holds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldKind {
    /// UUID identifier.
    Id,

    /// Arbitrary text.
    Text,

    /// Decimal number.
    Number,

    /// [`property::Kind`].
    PropertyKind,

    /// [`property::ListingKind`].
    ListingKind,

    /// `true` or `false`.
    Bool,

    /// [`DateTime`] in [RFC 3339] format.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    DateTime,

    /// List of values, not comparable.
    List,
}

impl FieldKind {
    /// Indicates whether values of this [`FieldKind`] can be range-compared.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::Text | Self::Number | Self::DateTime)
    }
}

/// Typed value of a [`Field`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// UUID identifier.
    Id(Uuid),

    /// Text.
    Text(String),

    /// Number.
    Number(Decimal),

    /// [`property::Kind`].
    PropertyKind(property::Kind),

    /// [`property::ListingKind`].
    ListingKind(property::ListingKind),

    /// Boolean.
    Bool(bool),

    /// [`DateTime`].
    DateTime(DateTime),

    /// Client input which doesn't parse as the type of its [`Field`].
    ///
    /// Never equals any stored value.
    Raw(String),
}

impl Value {
    /// Parses the provided `input` as a value of the given [`FieldKind`].
    ///
    /// Never fails: unparseable input results in [`Value::Raw`].
    #[must_use]
    pub fn parse(kind: FieldKind, input: &str) -> Self {
        let trimmed = input.trim();
        let parsed = match kind {
            FieldKind::Id => Uuid::parse_str(trimmed).ok().map(Self::Id),
            FieldKind::Text => (!input.contains('\0'))
                .then(|| Self::Text(input.to_owned())),
            FieldKind::Number => {
                Decimal::from_str(trimmed).ok().map(Self::Number)
            }
            FieldKind::PropertyKind => {
                trimmed.parse().ok().map(Self::PropertyKind)
            }
            FieldKind::ListingKind => {
                trimmed.parse().ok().map(Self::ListingKind)
            }
            FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Self::Bool(true)),
                "false" | "0" => Some(Self::Bool(false)),
                _ => None,
            },
            FieldKind::DateTime => {
                DateTime::from_rfc3339(trimmed).ok().map(Self::DateTime)
            }
            FieldKind::List => None,
        };
        parsed.unwrap_or_else(|| Self::Raw(input.to_owned()))
    }

    /// Compares this [`Value`] with the `other` one.
    ///
    /// [`None`] is returned if the values are of different types, or if
    /// either of them is [`Value::Raw`].
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Id(a), Self::Id(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => Some(a.cmp(b)),
            (Self::PropertyKind(a), Self::PropertyKind(b)) => {
                Some(a.u8().cmp(&b.u8()))
            }
            (Self::ListingKind(a), Self::ListingKind(b)) => {
                Some(a.u8().cmp(&b.u8()))
            }
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Indicates whether this [`Value`] equals to the `other` one.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "{v}"),
            Self::Text(v) | Self::Raw(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::PropertyKind(v) => write!(f, "{v}"),
            Self::ListingKind(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => {
                if n.is_integer() {
                    if let Some(i) = n.to_i64() {
                        return s.serialize_i64(i);
                    }
                }
                match n.to_f64() {
                    Some(f) => s.serialize_f64(f),
                    None => s.collect_str(n),
                }
            }
            Self::Bool(b) => s.serialize_bool(*b),
            Self::Id(_)
            | Self::Text(_)
            | Self::PropertyKind(_)
            | Self::ListingKind(_)
            | Self::DateTime(_)
            | Self::Raw(_) => s.collect_str(self),
        }
    }
}

/// Set of [`Field`]s to output.
///
/// [`Field::Id`] is always output, so never listed explicitly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Projection(Vec<Field>);

impl Projection {
    /// Parses a comma-separated list of field names.
    ///
    /// Unknown names are skipped. [`None`] is returned if nothing
    /// recognizable remains, meaning all the fields should be output.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let mut fields = Vec::new();
        for field in input.split(',').map(str::trim).filter_map(Field::parse) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        (!fields.is_empty()).then_some(Self(fields))
    }

    /// Returns the output [`Field`]s, including [`Field::Id`].
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        iter::once(Field::Id)
            .chain(self.0.iter().copied().filter(|f| *f != Field::Id))
    }
}

/// [`Property`] shaped for output by an optional [`Projection`].
#[derive(Clone, Debug)]
pub struct Record {
    /// Underlying [`Property`].
    pub property: Property,

    /// [`Projection`] to apply, if any.
    pub projection: Option<Projection>,
}

impl Record {
    /// Returns the [`Field`]s this [`Record`] outputs, in order.
    pub fn fields(&self) -> Box<dyn Iterator<Item = Field> + '_> {
        match &self.projection {
            Some(p) => Box::new(p.fields()),
            None => Box::new(Field::iter()),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(None)?;
        for field in self.fields() {
            let key = field.to_string();
            if field == Field::Images {
                map.serialize_entry(
                    &key,
                    &self
                        .property
                        .images
                        .iter()
                        .map(AsRef::<str>::as_ref)
                        .collect::<Vec<_>>(),
                )?;
            } else if let Some(v) = field.value(&self.property) {
                map.serialize_entry(&key, &v)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    //! [`Property`] fixtures.

    use common::DateTime;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::domain::{property, Property};

    /// Creates a [`Property`] with sane defaults, created `n` seconds after
    /// the Unix epoch.
    pub(crate) fn property(n: u16, title: &str, city: &str) -> Property {
        let created_at = DateTime::from_unix_timestamp(i64::from(n))
            .unwrap()
            .coerce();
        Property {
            id: property::Id::from(Uuid::from_u128(u128::from(n))),
            title: property::Title::new(title).unwrap(),
            description: property::Description::new("").unwrap(),
            price: Decimal::from(100_000),
            kind: property::Kind::Apartment,
            listing: property::ListingKind::Sale,
            bedrooms: 2,
            bathrooms: 1,
            area: Decimal::from(900),
            address: property::Address::new("1 Main Road").unwrap(),
            city: property::City::new(city).unwrap(),
            state: property::State::new("Maharashtra").unwrap(),
            images: vec![],
            featured: false,
            owner_id: Uuid::nil().into(),
            created_at,
            updated_at: created_at.coerce(),
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::domain::property;

    use super::{fixture, Field, FieldKind, Projection, Record, Value};

    #[test]
    fn field_names() {
        assert_eq!(Field::parse("propertyType"), Some(Field::PropertyType));
        assert_eq!(Field::parse("createdAt"), Some(Field::CreatedAt));
        assert_eq!(Field::parse("price"), Some(Field::Price));
        assert_eq!(Field::parse("Price"), None);
        assert_eq!(Field::parse("select"), None);
        assert_eq!(Field::ListingType.to_string(), "listingType");
    }

    #[test]
    fn value_parsing_is_fail_soft() {
        assert_eq!(
            Value::parse(FieldKind::Number, "100000"),
            Value::Number(Decimal::from(100_000)),
        );
        assert_eq!(
            Value::parse(FieldKind::Number, "cheap"),
            Value::Raw("cheap".into()),
        );
        assert_eq!(
            Value::parse(FieldKind::PropertyKind, "villa"),
            Value::PropertyKind(property::Kind::Villa),
        );
        assert_eq!(
            Value::parse(FieldKind::Bool, "TRUE"),
            Value::Bool(true),
        );
        assert_eq!(
            Value::parse(FieldKind::Bool, "yes"),
            Value::Raw("yes".into()),
        );
        assert_eq!(
            Value::parse(FieldKind::DateTime, "2024-01-01"),
            Value::Raw("2024-01-01".into()),
        );
        assert!(matches!(
            Value::parse(FieldKind::DateTime, "2024-01-01T00:00:00Z"),
            Value::DateTime(_),
        ));
    }

    #[test]
    fn text_with_nul_is_raw() {
        assert_eq!(
            Value::parse(FieldKind::Text, " Pune "),
            Value::Text(" Pune ".into()),
        );
        assert_eq!(
            Value::parse(FieldKind::Text, "Pu\0ne"),
            Value::Raw("Pu\0ne".into()),
        );
    }

    #[test]
    fn raw_never_matches() {
        let raw = Value::Raw("1".into());
        assert!(!raw.matches(&raw));
        assert!(!raw.matches(&Value::Number(Decimal::ONE)));
        let one = Value::Number(Decimal::ONE);
        assert!(one.matches(&Value::Number(Decimal::new(10, 1))));
    }

    #[test]
    fn projection() {
        let projection = Projection::parse("title, price,unknown,title").unwrap();
        assert_eq!(
            projection.fields().collect::<Vec<_>>(),
            [Field::Id, Field::Title, Field::Price],
        );
        assert!(Projection::parse("nope,").is_none());
    }

    #[test]
    fn record_serialization() {
        let property = fixture::property(1, "Sea view", "Mumbai");

        let record = Record {
            property: property.clone(),
            projection: Projection::parse("title,price"),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "id": "00000000-0000-0000-0000-000000000001",
                "title": "Sea view",
                "price": 100_000,
            }),
        );

        let record = Record {
            property,
            projection: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["propertyType"], "Apartment");
        assert_eq!(value["listingType"], "Sale");
        assert_eq!(value["images"], json!([]));
        assert_eq!(value["createdAt"], "1970-01-01T00:00:01Z");
        assert_eq!(value["featured"], false);
        assert_eq!(value.as_object().unwrap().len(), 17);
    }

    #[test]
    fn projected_images() {
        let mut property = fixture::property(1, "Sea view", "Mumbai");
        property.images = vec![
            property::Image::new("https://img.example/1.jpg"),
            property::Image::new("https://img.example/2.jpg"),
        ];

        let record = Record {
            property,
            projection: Projection::parse("images,featured"),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "id": "00000000-0000-0000-0000-000000000001",
                "images": [
                    "https://img.example/1.jpg",
                    "https://img.example/2.jpg",
                ],
                "featured": false,
            }),
        );
    }
}
