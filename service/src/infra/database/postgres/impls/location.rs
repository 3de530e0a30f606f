//! Location-related [`Database`] implementations.

use common::operations::{By, Select};
use itertools::Itertools as _;
use tracerr::Traced;

use crate::{
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::location::{
        list::{Key, Selector, TotalCount},
        Group, GroupBy,
    },
};

/// Returns the `properties` table column locations are grouped by.
const fn column(group_by: GroupBy) -> &'static str {
    match group_by {
        GroupBy::City => "city",
        GroupBy::State => "state",
    }
}

impl<C> Database<Select<By<TotalCount, GroupBy>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<TotalCount, GroupBy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT COUNT(DISTINCT {})::INT8 \
             FROM properties",
            column(by.into_inner()),
        );
        self.query_one(&sql, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| {
                usize::try_from(row.get::<_, i64>(0))
                    .expect("`COUNT()` is never negative")
                    .into()
            })
    }
}

impl<C> Database<Select<By<Vec<Group>, Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Group>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Group>, Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Selector {
            group_by,
            sort,
            arguments,
        } = by.into_inner();

        let limit = i64::try_from(arguments.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(arguments.start_index()).unwrap_or(i64::MAX);

        // The earliest created record of a location provides its image.
        let image = match group_by {
            GroupBy::City => {
                "(SELECT i \
                  FROM unnest(f.images) WITH ORDINALITY AS t(i, n) \
                  WHERE btrim(i) <> '' \
                  ORDER BY n \
                  LIMIT 1)"
            }
            GroupBy::State => "NULL::VARCHAR",
        };
        let sql = format!(
            "WITH groups AS (\
                 SELECT {col} AS name, COUNT(*)::INT8 AS count \
                 FROM properties \
                 GROUP BY {col}\
             ), firsts AS (\
                 SELECT DISTINCT ON ({col}) {col} AS name, images \
                 FROM properties \
                 ORDER BY {col}, created_at ASC, id ASC\
             ) \
             SELECT g.name, g.count, {image} AS image \
             FROM groups AS g \
             JOIN firsts AS f ON f.name = g.name \
             ORDER BY {ordering} \
             LIMIT $1::INT8 \
             OFFSET $2::INT8",
            col = column(group_by),
            ordering = sort.keys().iter().format_with(", ", |(key, order), f| {
                let key = match key {
                    Key::Name => "g.name",
                    Key::Count => "g.count",
                };
                f(&format_args!("{key} {}", order.sql()))
            }),
        );
        Ok(self
            .query(&sql, &[&limit, &offset])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Group {
                name: row.get("name"),
                count: usize::try_from(row.get::<_, i64>("count"))
                    .expect("`COUNT(*)` is never negative"),
                image: row.get("image"),
            })
            .collect())
    }
}
