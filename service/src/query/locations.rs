//! [`Query`] collection related to locations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    read::location::{list, Group, GroupBy},
    Service,
};

use super::Query;

/// Queries a [`list::Page`] of locations [`Group`]ed by the provided
/// [`list::Selector`].
#[derive(Clone, Debug)]
pub struct Locations(pub list::Selector);

impl Locations {
    /// Creates a new [`Locations`] query out of the raw client input, bounded
    /// by the [`Service`] pagination limits.
    #[must_use]
    pub fn new<Db>(
        service: &Service<Db>,
        group_by: GroupBy,
        sort: Option<&str>,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Self {
        Self(list::Selector::build(
            group_by,
            sort,
            page,
            limit,
            service.config().pagination,
        ))
    }
}

impl<Db> Query<Locations> for Service<Db>
where
    Db: Database<
            Select<By<list::TotalCount, GroupBy>>,
            Ok = list::TotalCount,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Group>, list::Selector>>,
            Ok = Vec<Group>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = list::Page;
    type Err = Traced<database::Error>;

    #[tracing::instrument(skip(self), level = "debug")]
    async fn execute(
        &self,
        Locations(selector): Locations,
    ) -> Result<Self::Ok, Self::Err> {
        super::paginate(
            self.database(),
            selector.arguments,
            selector.group_by,
            selector,
        )
        .await
        .map_err(tracerr::wrap!())
    }
}
