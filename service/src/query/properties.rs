//! [`Query`] collection related to the multiple [`Property`] records.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::Property,
    infra::{database, Database},
    read::property::{list, Record},
    Service,
};

use super::Query;

/// Queries a [`list::Page`] of [`Property`] records matching the provided
/// [`list::FilterSpec`].
#[derive(Clone, Debug)]
pub struct Search(pub list::FilterSpec);

impl Search {
    /// Creates a new [`Search`] out of the provided [`list::RawParams`],
    /// bounded by the [`Service`] pagination limits.
    #[must_use]
    pub fn new<Db>(service: &Service<Db>, raw: list::RawParams) -> Self {
        Self(list::FilterSpec::build(raw, service.config().pagination))
    }
}

impl<Db> Query<Search> for Service<Db>
where
    Db: Database<
            Select<By<list::TotalCount, list::Filter>>,
            Ok = list::TotalCount,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Property>, list::FilterSpec>>,
            Ok = Vec<Property>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = list::Page;
    type Err = Traced<database::Error>;

    #[tracing::instrument(skip(self), level = "debug")]
    async fn execute(
        &self,
        Search(spec): Search,
    ) -> Result<Self::Ok, Self::Err> {
        let projection = spec.projection.clone();
        let page = super::paginate(
            self.database(),
            spec.arguments,
            spec.filter.clone(),
            spec,
        )
        .await
        .map_err(tracerr::wrap!())?;

        Ok(page.map(|property| Record {
            property,
            projection: projection.clone(),
        }))
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::Insert,
        pagination::{Arguments, Envelope},
    };
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::{
        domain::Property,
        infra::{Database as _, Memory},
        read::property::{fixture, list},
        Config, Query as _, Service,
    };

    use super::Search;

    async fn service(
        properties: impl IntoIterator<Item = Property>,
    ) -> Service<Memory> {
        let db = Memory::new();
        for p in properties {
            db.execute(Insert(p)).await.unwrap();
        }
        Service::new(Config::default(), db)
    }

    async fn search(svc: &Service<Memory>, pairs: &[(&str, &str)]) -> list::Page {
        let raw = list::RawParams::from_pairs(pairs.iter().copied());
        svc.execute(Search::new(svc, raw)).await.unwrap()
    }

    fn ids(page: &list::Page) -> Vec<u128> {
        page.items
            .iter()
            .map(|r| Uuid::from(r.property.id).as_u128())
            .collect()
    }

    #[tokio::test]
    async fn filters_by_price_range() {
        let svc = service([90_000, 100_000, 150_000].into_iter().zip(1..).map(
            |(price, n)| {
                let mut p = fixture::property(n, "Flat", "Pune");
                p.price = Decimal::from(price);
                p
            },
        ))
        .await;

        let page = search(&svc, &[("price[gte]", "100000")]).await;
        assert_eq!(ids(&page), [3, 2]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn paginates() {
        let svc = service((1..=25).map(|n| fixture::property(n, "Flat", "Pune")))
            .await;

        let page = search(&svc, &[("page", "2"), ("limit", "10")]).await;
        assert_eq!(ids(&page), (6..=15_u128).rev().collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.next(), Arguments::new(3, 10));
        assert_eq!(page.prev(), Arguments::new(1, 10));

        let last = search(&svc, &[("page", "3"), ("limit", "10")]).await;
        assert_eq!(ids(&last), [5, 4, 3, 2, 1]);
        assert_eq!(last.next(), None);

        let again = search(&svc, &[("page", "2"), ("limit", "10")]).await;
        assert_eq!(ids(&again), ids(&page));
        assert_eq!(again.next(), page.next());
    }

    #[tokio::test]
    async fn empty_result() {
        let svc = service([fixture::property(1, "Flat", "Pune")]).await;

        let page = search(&svc, &[("city", "Atlantis")]).await;
        let envelope = Envelope::from(page);
        assert_eq!(envelope.count, 0);
        assert_eq!(envelope.total_pages, 0);
        assert!(envelope.data.is_empty());
        assert_eq!(envelope.pagination.next, None);
        assert_eq!(envelope.pagination.prev, None);
    }

    #[tokio::test]
    async fn searches_text_ignoring_case() {
        let svc = service([
            fixture::property(1, "Flat", "Pune"),
            fixture::property(2, "House", "Mumbai"),
            fixture::property(3, "Villa", "Goa"),
        ])
        .await;

        for q in ["mumbai", "MUMBAI", "Mumbai"] {
            let page = search(&svc, &[("q", q)]).await;
            assert_eq!(ids(&page), [2], "q = {q}");
        }
    }

    #[tokio::test]
    async fn degraded_input_falls_back() {
        let svc = service((1..=12).map(|n| fixture::property(n, "Flat", "Pune")))
            .await;

        let page =
            search(&svc, &[("page", "abc"), ("limit", "-5"), ("colour", "red")])
                .await;
        assert_eq!(page.arguments, Arguments::new(1, 10).unwrap());
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total, 12);

        let page = search(&svc, &[("limit", "1000")]).await;
        assert_eq!(page.arguments.limit(), 100);
    }

    #[tokio::test]
    async fn sorts_and_projects() {
        let svc = service([(1, 300), (2, 100), (3, 300)].map(|(n, price)| {
            let mut p = fixture::property(n, "Flat", "Pune");
            p.price = Decimal::from(price);
            p
        }))
        .await;

        let page =
            search(&svc, &[("sort", "-price"), ("select", "price")]).await;
        assert_eq!(ids(&page), [1, 3, 2]);

        let json = serde_json::to_value(&page.items[0]).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 2);
        assert_eq!(json["price"], 300);
    }

    #[tokio::test]
    async fn fails_when_store_is_unavailable() {
        let svc = service([fixture::property(1, "Flat", "Pune")]).await;
        svc.database().set_available(false).await;

        let res = svc
            .execute(Search::new(&svc, list::RawParams::default()))
            .await;
        assert!(res.is_err());
    }
}
