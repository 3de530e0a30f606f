//! [`Property`] list definitions.
//!
//! Client-supplied query parameters are turned into a [`FilterSpec`] here,
//! which is then executed by a [`Database`] against the [`Property`]
//! collection.

use std::{cmp::Ordering, str::FromStr, sync::LazyLock};

use common::pagination::{self, Arguments, Limits, Order};
use derive_more::{From, Into};
use regex::Regex;
use strum::EnumString;
use tracing as log;

use crate::domain::Property;
#[cfg(doc)]
use crate::infra::Database;

use super::{Field, Projection, Record, Value};

/// Keys of the [`RawParams`] controlling the query rather than filtering.
pub const RESERVED_KEYS: [&str; 5] = ["select", "sort", "page", "limit", "q"];

/// A [`pagination::Page`] of [`Record`]s.
pub type Page = pagination::Page<Record>;

/// Sort of a [`Property`] list.
pub type Sort = pagination::Sort<Field>;

/// Raw listing query parameters, as received from a client.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawParams {
    /// Comma-separated list of fields to output.
    pub select: Option<String>,

    /// Comma-separated list of fields to sort by.
    pub sort: Option<String>,

    /// Requested page number.
    pub page: Option<String>,

    /// Requested page size.
    pub limit: Option<String>,

    /// Free-text search query.
    pub q: Option<String>,

    /// Remaining parameters, with the values of repeated keys grouped in the
    /// order of appearance.
    pub filters: Vec<(String, Vec<String>)>,
}

impl RawParams {
    /// Collects [`RawParams`] out of query string key/value pairs.
    ///
    /// Only the first occurrence of a reserved key is taken into account.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.into(), value.into());
            let reserved = match key.as_str() {
                "select" => &mut params.select,
                "sort" => &mut params.sort,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                "q" => &mut params.q,
                _ => {
                    if let Some((_, values)) =
                        params.filters.iter_mut().find(|(k, _)| *k == key)
                    {
                        values.push(value);
                    } else {
                        params.filters.push((key, vec![value]));
                    }
                    continue;
                }
            };
            _ = reserved.get_or_insert(value);
        }
        params
    }
}

/// Comparison operator of a [`FieldFilter::Range`].
#[derive(Clone, Copy, Debug, EnumString, Eq, Hash, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum RangeOp {
    /// Greater than.
    Gt,

    /// Greater than or equal.
    Gte,

    /// Less than.
    Lt,

    /// Less than or equal.
    Lte,
}

impl RangeOp {
    /// Indicates whether the provided [`Ordering`] of a stored value against
    /// the filtering one satisfies this [`RangeOp`].
    #[must_use]
    pub fn accepts(self, ord: Ordering) -> bool {
        match self {
            Self::Gt => ord.is_gt(),
            Self::Gte => ord.is_ge(),
            Self::Lt => ord.is_lt(),
            Self::Lte => ord.is_le(),
        }
    }
}

/// Filter applied to a single [`Field`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldFilter {
    /// Equal to the [`Value`].
    Eq(Value),

    /// Satisfies the [`RangeOp`] against the [`Value`].
    Range(RangeOp, Value),

    /// Equal to any of the [`Value`]s.
    In(Vec<Value>),
}

impl FieldFilter {
    /// Indicates whether the provided stored [`Value`] passes this
    /// [`FieldFilter`].
    #[must_use]
    pub fn accepts(&self, stored: &Value) -> bool {
        match self {
            Self::Eq(v) => stored.matches(v),
            Self::Range(op, v) => {
                stored.compare(v).is_some_and(|ord| op.accepts(ord))
            }
            Self::In(vs) => vs.iter().any(|v| stored.matches(v)),
        }
    }
}

/// Free-text search over the [`Field::SEARCHABLE`] fields.
///
/// Matches if any of its terms is a word of any searchable field, ignoring
/// case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextSearch {
    /// Lowercased alphanumeric terms to search for.
    terms: Vec<String>,
}

impl TextSearch {
    /// Creates a new [`TextSearch`] out of the client `query`.
    ///
    /// A query without any alphanumeric word matches nothing.
    #[must_use]
    pub fn new(query: &str) -> Self {
        let mut terms = Vec::new();
        for term in Self::words(query) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        Self { terms }
    }

    /// Splits the provided `text` into lowercased alphanumeric words.
    pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
    }

    /// Returns the terms of this [`TextSearch`].
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Indicates whether the provided [`Property`] matches this
    /// [`TextSearch`].
    #[must_use]
    pub fn accepts(&self, property: &Property) -> bool {
        let texts: [&str; 4] = [
            property.title.as_ref(),
            property.city.as_ref(),
            property.state.as_ref(),
            property.description.as_ref(),
        ];
        texts
            .into_iter()
            .flat_map(Self::words)
            .any(|w| self.terms.contains(&w))
    }
}

/// Filter of a [`Property`] list.
///
/// All the conditions must hold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    /// [`FieldFilter`]s to apply.
    pub fields: Vec<(Field, FieldFilter)>,

    /// [`TextSearch`] to apply, if any.
    pub text: Option<TextSearch>,
}

impl Filter {
    /// Indicates whether the provided [`Property`] passes this [`Filter`].
    #[must_use]
    pub fn accepts(&self, property: &Property) -> bool {
        self.fields.iter().all(|(field, filter)| {
            field.value(property).is_some_and(|v| filter.accepts(&v))
        }) && self.text.as_ref().map_or(true, |t| t.accepts(property))
    }
}

/// Parsed and validated listing query.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterSpec {
    /// [`Filter`] selecting the [`Property`] records.
    pub filter: Filter,

    /// [`Projection`] of the output records, if any.
    pub projection: Option<Projection>,

    /// [`Sort`] of the records.
    pub sort: Sort,

    /// Pagination [`Arguments`].
    pub arguments: Arguments,
}

impl FilterSpec {
    /// Builds a [`FilterSpec`] out of the provided [`RawParams`].
    ///
    /// Never fails: malformed input is normalized to a default or to a
    /// filter matching nothing.
    #[must_use]
    pub fn build(raw: RawParams, limits: Limits) -> Self {
        let RawParams {
            select,
            sort,
            page,
            limit,
            q,
            filters,
        } = raw;

        let mut filter = Filter {
            fields: Vec::with_capacity(filters.len()),
            text: q
                .filter(|q| !q.trim().is_empty())
                .map(|q| TextSearch::new(&q)),
        };
        for (key, values) in filters {
            match Self::parse_key(&key) {
                Some((field, op)) => {
                    filter.fields.extend(
                        Self::field_filters(field, op, &values)
                            .map(|f| (field, f)),
                    );
                }
                None => log::debug!("ignoring unknown filter `{key}`"),
            }
        }

        Self {
            filter,
            projection: select.as_deref().and_then(Projection::parse),
            sort: sort
                .as_deref()
                .and_then(|s| {
                    Sort::parse(s, |name| {
                        Field::parse(name).filter(|f| f.is_comparable())
                    })
                })
                .unwrap_or_else(Self::default_sort),
            arguments: Arguments::parse(
                page.as_deref(),
                limit.as_deref(),
                limits,
            ),
        }
    }

    /// Returns the [`Sort`] used when none is requested.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn default_sort() -> Sort {
        Sort::new([(Field::CreatedAt, Order::Descending)]).expect("non-empty")
    }

    /// Parses a filter key like `price` or `price[gte]`.
    ///
    /// [`None`] is returned for unknown or non-filterable fields and unknown
    /// operators.
    fn parse_key(key: &str) -> Option<(Field, Option<Operator>)> {
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^(?<field>[A-Za-z]+)(?:\[(?<op>\w+)\])?$")
                .expect("valid regex")
        });

        let captures = REGEX.captures(key)?;
        let field = Field::parse(&captures["field"])
            .filter(|f| f.is_comparable())?;
        let op = match captures.name("op") {
            Some(op) => Some(op.as_str().parse::<Operator>().ok()?),
            None => None,
        };
        Some((field, op))
    }

    /// Creates [`FieldFilter`]s for the `values` of the `field` key.
    fn field_filters(
        field: Field,
        op: Option<Operator>,
        values: &[String],
    ) -> impl Iterator<Item = FieldFilter> + '_ {
        let kind = field.kind();
        let filters: Vec<FieldFilter> = match op {
            None if values.len() == 1 => {
                vec![FieldFilter::Eq(Value::parse(kind, &values[0]))]
            }
            None => vec![FieldFilter::In(
                values.iter().map(|v| Value::parse(kind, v)).collect(),
            )],
            Some(Operator::In) => vec![FieldFilter::In(
                values
                    .iter()
                    .flat_map(|v| v.split(','))
                    .map(|v| Value::parse(kind, v))
                    .collect(),
            )],
            Some(Operator::Range(op)) => values
                .iter()
                .map(|v| match Value::parse(kind, v) {
                    v @ Value::Raw(_) => FieldFilter::Eq(v),
                    _ if !kind.is_ordered() => {
                        FieldFilter::Eq(Value::Raw(v.clone()))
                    }
                    parsed => FieldFilter::Range(op, parsed),
                })
                .collect(),
        };
        filters.into_iter()
    }
}

/// Operator token of a filter key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Operator {
    /// [`FieldFilter::Range`] operator.
    Range(RangeOp),

    /// [`FieldFilter::In`] operator.
    In,
}

impl FromStr for Operator {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "in" {
            return Ok(Self::In);
        }
        s.parse().map(Self::Range)
    }
}

/// Total count of [`Property`] list items matching a [`Filter`].
#[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
pub struct TotalCount(usize);

#[cfg(test)]
mod spec {
    use common::pagination::{Arguments, Limits, Order};
    use rust_decimal::Decimal;

    use crate::{
        domain::property,
        read::property::{fixture, Field},
    };

    use super::{
        FieldFilter, FilterSpec, RangeOp, RawParams, TextSearch, Value,
        RESERVED_KEYS,
    };

    fn build(pairs: &[(&str, &str)]) -> FilterSpec {
        FilterSpec::build(
            RawParams::from_pairs(pairs.iter().copied()),
            Limits::default(),
        )
    }

    fn number(n: i64) -> Value {
        Value::Number(Decimal::from(n))
    }

    #[test]
    fn collects_raw_params() {
        let raw = RawParams::from_pairs([
            ("page", "2"),
            ("city", "Pune"),
            ("page", "3"),
            ("city", "Mumbai"),
            ("q", "sea"),
        ]);

        assert_eq!(raw.page.as_deref(), Some("2"));
        assert_eq!(raw.q.as_deref(), Some("sea"));
        assert_eq!(
            raw.filters,
            [("city".to_owned(), vec!["Pune".to_owned(), "Mumbai".to_owned()])],
        );
    }

    #[test]
    fn reserved_keys_never_filter() {
        let pairs = RESERVED_KEYS.map(|k| (k, "price"));
        let spec = build(&pairs);
        assert!(spec.filter.fields.is_empty());

        let spec = build(&[]);
        assert!(spec.filter.fields.is_empty());
        assert!(spec.filter.text.is_none());
    }

    #[test]
    fn equality_and_ranges() {
        let spec = build(&[
            ("price[gte]", "100000"),
            ("price[lte]", "500000"),
            ("propertyType", "Villa"),
        ]);

        assert_eq!(
            spec.filter.fields,
            [
                (Field::Price, FieldFilter::Range(RangeOp::Gte, number(100_000))),
                (Field::Price, FieldFilter::Range(RangeOp::Lte, number(500_000))),
                (
                    Field::PropertyType,
                    FieldFilter::Eq(Value::PropertyKind(property::Kind::Villa)),
                ),
            ],
        );
    }

    #[test]
    fn in_lists() {
        let spec = build(&[
            ("bedrooms[in]", "2,3"),
            ("city", "Pune"),
            ("city", "Mumbai"),
        ]);

        assert_eq!(
            spec.filter.fields,
            [
                (Field::Bedrooms, FieldFilter::In(vec![number(2), number(3)])),
                (
                    Field::City,
                    FieldFilter::In(vec![
                        Value::Text("Pune".into()),
                        Value::Text("Mumbai".into()),
                    ]),
                ),
            ],
        );
    }

    #[test]
    fn malformed_values_degrade_to_raw_equality() {
        let spec = build(&[
            ("price", "cheap"),
            ("price[gt]", "lots"),
            ("featured[gt]", "true"),
        ]);

        assert_eq!(
            spec.filter.fields,
            [
                (Field::Price, FieldFilter::Eq(Value::Raw("cheap".into()))),
                (Field::Price, FieldFilter::Eq(Value::Raw("lots".into()))),
                (Field::Featured, FieldFilter::Eq(Value::Raw("true".into()))),
            ],
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let spec = build(&[
            ("colour", "red"),
            ("price[ne]", "1"),
            ("images", "a.jpg"),
            ("price[gte", "1"),
            ("_", "1700000000"),
        ]);

        assert!(spec.filter.fields.is_empty());
    }

    #[test]
    fn text_search() {
        let spec = build(&[("q", "Sea-View  MUMBAI sea")]);
        assert_eq!(
            spec.filter.text.unwrap().terms(),
            ["sea", "view", "mumbai"],
        );

        assert!(build(&[("q", "  ")]).filter.text.is_none());
        assert_eq!(
            build(&[("q", "!!")]).filter.text,
            Some(TextSearch::new("")),
        );
    }

    #[test]
    fn text_search_splits_on_punctuation() {
        let mut pune = fixture::property(1, "Cosy flat", "Pune");
        pune.description =
            property::Description::new("mail sales@mumbai-homes.com").unwrap();

        assert_eq!(
            TextSearch::words(pune.description.as_ref()).collect::<Vec<_>>(),
            ["mail", "sales", "mumbai", "homes", "com"],
        );
        assert!(build(&[("q", "MUMBAI")]).filter.accepts(&pune));
        assert!(build(&[("q", "homes.com")]).filter.accepts(&pune));
        assert_eq!(
            TextSearch::new("mumbai-homes.org").terms(),
            ["mumbai", "homes", "org"],
        );
    }

    #[test]
    fn filtering() {
        let mut villa = fixture::property(1, "Sea view villa", "Mumbai");
        villa.kind = property::Kind::Villa;
        villa.price = Decimal::from(250_000);
        let flat = fixture::property(2, "Cosy flat", "Pune");

        let spec = build(&[("price[gte]", "200000"), ("propertyType", "villa")]);
        assert!(spec.filter.accepts(&villa));
        assert!(!spec.filter.accepts(&flat));

        let spec = build(&[("q", "MUMBAI")]);
        assert!(spec.filter.accepts(&villa));
        assert!(!spec.filter.accepts(&flat));

        let spec = build(&[("q", "?")]);
        assert!(!spec.filter.accepts(&villa));

        let spec = build(&[("price", "cheap")]);
        assert!(!spec.filter.accepts(&flat));

        assert!(build(&[]).filter.accepts(&flat));
    }

    #[test]
    fn sorting() {
        assert_eq!(
            build(&[]).sort.keys(),
            [(Field::CreatedAt, Order::Descending)],
        );
        assert_eq!(
            build(&[("sort", "-price,title")]).sort.keys(),
            [
                (Field::Price, Order::Descending),
                (Field::Title, Order::Ascending),
            ],
        );
        assert_eq!(
            build(&[("sort", "images,unknown")]).sort.keys(),
            [(Field::CreatedAt, Order::Descending)],
        );
    }

    #[test]
    fn projection() {
        let spec = build(&[("select", "title,price")]);
        assert_eq!(
            spec.projection.unwrap().fields().collect::<Vec<_>>(),
            [Field::Id, Field::Title, Field::Price],
        );
        assert!(build(&[]).projection.is_none());
    }

    #[test]
    fn pagination_defaults() {
        let spec = build(&[("page", "abc"), ("limit", "-5")]);
        assert_eq!(spec.arguments, Arguments::new(1, 10).unwrap());

        let spec = build(&[("page", "2"), ("limit", "20")]);
        assert_eq!(spec.arguments, Arguments::new(2, 20).unwrap());
        assert_eq!(spec.arguments.start_index(), 20);
    }
}
