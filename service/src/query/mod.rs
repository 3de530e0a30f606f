//! [`Query`] definition.

pub mod locations;
pub mod properties;
pub mod property;

use common::{
    operations::{By, Select},
    pagination::{Arguments, Page},
};
use futures::future;
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

pub use self::{locations::Locations, properties::Search};

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Selects a [`Page`] of `I`tems from the provided [`Database`].
///
/// Total count is selected by `count` and the items by `fetch`, both
/// concurrently. Either failing fails the whole [`Page`].
async fn paginate<Db, C, CB, I, FB>(
    database: &Db,
    arguments: Arguments,
    count: CB,
    fetch: FB,
) -> Result<Page<I>, Traced<database::Error>>
where
    Db: Database<Select<By<C, CB>>, Ok = C, Err = Traced<database::Error>>
        + Database<
            Select<By<Vec<I>, FB>>,
            Ok = Vec<I>,
            Err = Traced<database::Error>,
        >,
    C: Into<usize>,
{
    let (total, items) = future::try_join(
        database.execute(Select(By::<C, _>::new(count))),
        database.execute(Select(By::<Vec<I>, _>::new(fetch))),
    )
    .await
    .map_err(tracerr::wrap!())?;

    Ok(Page::new(arguments, items, total.into()))
}
