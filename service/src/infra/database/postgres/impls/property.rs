//! [`Property`]-related [`Database`] implementations.

use common::operations::{By, Select};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::property::{
        list::{self, FieldFilter},
        Field, FieldKind, Value,
    },
};

/// Columns of the `properties` table making up a [`Property`].
const COLUMNS: &str = "\
    id, title, description, price, property_type, listing_type, \
    bedrooms, bathrooms, area, address, city, state, images, featured, \
    owner_id, created_at, updated_at";

/// Lowercased alphanumeric words the text search is performed over, split
/// the same way as [`list::TextSearch::words()`] does.
///
/// Must match the expression of the `properties_words_idx` index.
const SEARCH_WORDS: &str = "\
    regexp_split_to_array(\
        lower(title || ' ' || city || ' ' || state || ' ' || description), \
        '[^[:alnum:]]+')";

/// Returns the `properties` table column storing the provided [`Field`].
const fn column(field: Field) -> &'static str {
    match field {
        Field::Id => "id",
        Field::Title => "title",
        Field::Description => "description",
        Field::Price => "price",
        Field::PropertyType => "property_type",
        Field::ListingType => "listing_type",
        Field::Bedrooms => "bedrooms",
        Field::Bathrooms => "bathrooms",
        Field::Area => "area",
        Field::Address => "address",
        Field::City => "city",
        Field::State => "state",
        Field::Images => "images",
        Field::Featured => "featured",
        Field::Owner => "owner_id",
        Field::CreatedAt => "created_at",
        Field::UpdatedAt => "updated_at",
    }
}

/// Returns the SQL type a [`Value`] of the provided [`FieldKind`] is bound
/// as.
const fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Id => "UUID",
        FieldKind::Text | FieldKind::List => "VARCHAR",
        FieldKind::Number => "NUMERIC",
        FieldKind::PropertyKind | FieldKind::ListingKind => "INT2",
        FieldKind::Bool => "BOOLEAN",
        FieldKind::DateTime => "TIMESTAMPTZ",
    }
}

/// Returns the provided [`Value`] as a statement parameter.
///
/// [`None`] is returned for a [`Value::Raw`], which never matches anything.
fn param(value: &Value) -> Option<&(dyn ToSql + Sync)> {
    let param: &(dyn ToSql + Sync) = match value {
        Value::Id(v) => v,
        Value::Text(v) => v,
        Value::Number(v) => v,
        Value::PropertyKind(v) => v,
        Value::ListingKind(v) => v,
        Value::Bool(v) => v,
        Value::DateTime(v) => v,
        Value::Raw(_) => return None,
    };
    Some(param)
}

/// SQL `WHERE` condition of a [`list::Filter`] along with its parameters.
struct Condition<'a> {
    /// SQL of this [`Condition`].
    sql: String,

    /// Parameters bound in this [`Condition`].
    params: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Condition<'a> {
    /// Builds a new [`Condition`] out of the provided [`list::Filter`].
    ///
    /// `terms` are the text search terms of the [`list::Filter`], if any.
    fn new(filter: &'a list::Filter, terms: Option<&'a Vec<String>>) -> Self {
        let mut this = Self {
            sql: "TRUE".into(),
            params: Vec::new(),
        };

        for (field, filter) in &filter.fields {
            let (col, ty) = (column(*field), sql_type(field.kind()));
            let sql = match filter {
                FieldFilter::Eq(v) => match param(v) {
                    Some(p) => format!("{col} = ${}::{ty}", this.bind(p)),
                    None => "FALSE".into(),
                },
                FieldFilter::Range(op, v) => match param(v) {
                    Some(p) => {
                        let op = match op {
                            list::RangeOp::Gt => ">",
                            list::RangeOp::Gte => ">=",
                            list::RangeOp::Lt => "<",
                            list::RangeOp::Lte => "<=",
                        };
                        format!("{col} {op} ${}::{ty}", this.bind(p))
                    }
                    None => "FALSE".into(),
                },
                FieldFilter::In(vs) => {
                    let idxs = vs
                        .iter()
                        .filter_map(param)
                        .map(|p| this.bind(p))
                        .collect::<Vec<_>>();
                    if idxs.is_empty() {
                        "FALSE".into()
                    } else {
                        format!(
                            "{col} IN ({})",
                            idxs.iter().format_with(", ", |idx, f| {
                                f(&format_args!("${idx}::{ty}"))
                            }),
                        )
                    }
                }
            };
            this.and(&sql);
        }

        if let Some(text) = &filter.text {
            let sql = match terms {
                Some(t) if !text.terms().is_empty() => {
                    format!("{SEARCH_WORDS} && ${}::TEXT[]", this.bind(t))
                }
                _ => "FALSE".into(),
            };
            this.and(&sql);
        }

        this
    }

    /// Binds the provided parameter, returning its 1-based index.
    fn bind(&mut self, param: &'a (dyn ToSql + Sync)) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Adds the provided SQL to this [`Condition`] via `AND`.
    fn and(&mut self, sql: &str) {
        self.sql.push_str(" AND ");
        self.sql.push_str(sql);
    }
}

/// Reads a [`Property`] out of the provided [`Row`].
fn property_from_row(row: &Row) -> Property {
    Property {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        kind: row.get("property_type"),
        listing: row.get("listing_type"),
        bedrooms: property::Rooms::try_from(row.get::<_, i32>("bedrooms"))
            .expect("`bedrooms` overflow"),
        bathrooms: property::Rooms::try_from(row.get::<_, i32>("bathrooms"))
            .expect("`bathrooms` overflow"),
        area: row.get("area"),
        address: row.get("address"),
        city: row.get("city"),
        state: row.get("state"),
        images: row.get("images"),
        featured: row.get("featured"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: property::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        self.query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(property_from_row))
    }
}

impl<C> Database<Select<By<list::TotalCount, list::Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::TotalCount, list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let terms = filter.text.as_ref().map(|t| t.terms().to_vec());
        let cond = Condition::new(&filter, terms.as_ref());

        let sql = format!(
            "SELECT COUNT(*)::INT8 \
             FROM properties \
             WHERE {}",
            cond.sql,
        );
        self.query_one(&sql, &cond.params)
            .await
            .map_err(tracerr::wrap!())
            .map(|row| {
                usize::try_from(row.get::<_, i64>(0))
                    .expect("`COUNT(*)` is never negative")
                    .into()
            })
    }
}

impl<C> Database<Select<By<Vec<Property>, list::FilterSpec>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, list::FilterSpec>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::FilterSpec {
            filter,
            sort,
            arguments,
            ..
        } = by.into_inner();

        let limit = i64::try_from(arguments.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(arguments.start_index()).unwrap_or(i64::MAX);
        let terms = filter.text.as_ref().map(|t| t.terms().to_vec());

        let mut cond = Condition::new(&filter, terms.as_ref());
        let limit_idx = cond.bind(&limit);
        let offset_idx = cond.bind(&offset);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE {filtering} \
             ORDER BY {ordering} id ASC \
             LIMIT ${limit_idx}::INT8 \
             OFFSET ${offset_idx}::INT8",
            filtering = cond.sql,
            ordering = sort.keys().iter().format_with("", |(field, order), f| {
                f(&format_args!("{} {}, ", column(*field), order.sql()))
            }),
        );
        Ok(self
            .query(&sql, &cond.params)
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(property_from_row)
            .collect())
    }
}
