//! In-memory [`Database`] implementation.

use std::{cmp::Ordering, sync::Arc};

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error as StdError};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{database, Database},
    read::{
        location::{self, Group, GroupBy},
        property::list,
    },
};

/// In-memory [`Database`] of [`Property`] records.
///
/// Can be switched [unavailable], failing every operation.
///
/// [unavailable]: Memory::set_available
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<RwLock<Inner>>);

/// Inner state of a [`Memory`] database.
#[derive(Debug, Default)]
struct Inner {
    /// Stored [`Property`] records, in insertion order.
    properties: Vec<Property>,

    /// Indicator whether the [`Memory`] database fails every operation.
    unavailable: bool,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes this [`Memory`] database (un)available.
    pub async fn set_available(&self, available: bool) {
        self.0.write().await.unavailable = !available;
    }

    /// Returns the stored [`Property`] records.
    async fn properties(
        &self,
    ) -> Result<RwLockReadGuard<'_, Vec<Property>>, Traced<database::Error>>
    {
        let inner = self.0.read().await;
        if inner.unavailable {
            return Err(tracerr::new!(database::Error::from(Error::Unavailable)));
        }
        Ok(RwLockReadGuard::map(inner, |i| &i.properties))
    }

    /// Compares [`Property`] records by the provided [`list::Sort`], breaking
    /// ties by their IDs.
    fn compare(sort: &list::Sort, a: &Property, b: &Property) -> Ordering {
        sort.compare(a, b, |field, a, b| {
            field
                .value(a)
                .zip(field.value(b))
                .and_then(|(a, b)| a.compare(&b))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.id.cmp(&b.id))
    }

    /// Groups [`Property`] records into locations by the provided [`GroupBy`].
    ///
    /// Groups are returned in no particular order.
    fn group(properties: &[Property], group_by: GroupBy) -> Vec<Group> {
        let mut earliest: Vec<&Property> = properties.iter().collect();
        earliest.sort_by_key(|p| (p.created_at, p.id));

        let mut groups: Vec<Group> = Vec::new();
        for p in earliest {
            let name: &str = match group_by {
                GroupBy::City => p.city.as_ref(),
                GroupBy::State => p.state.as_ref(),
            };
            if let Some(group) = groups.iter_mut().find(|g| g.name == name) {
                group.count += 1;
            } else {
                groups.push(Group {
                    name: name.to_owned(),
                    count: 1,
                    image: match group_by {
                        GroupBy::City => p.cover_image().cloned(),
                        GroupBy::State => None,
                    },
                });
            }
        }
        groups
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Memory`] database is switched unavailable.
    #[display("`Memory` database is unavailable")]
    Unavailable,
}

impl Database<Insert<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut inner = self.0.write().await;
        if inner.unavailable {
            return Err(tracerr::new!(database::Error::from(Error::Unavailable)));
        }
        if let Some(existing) =
            inner.properties.iter_mut().find(|p| p.id == property.id)
        {
            *existing = property;
        } else {
            inner.properties.push(property);
        }
        Ok(())
    }
}

impl Database<Select<By<Option<Property>, property::Id>>> for Memory {
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .properties()
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }
}

impl Database<Select<By<list::TotalCount, list::Filter>>> for Memory {
    type Ok = list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::TotalCount, list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self
            .properties()
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .filter(|p| filter.accepts(p))
            .count()
            .into())
    }
}

impl Database<Select<By<Vec<Property>, list::FilterSpec>>> for Memory {
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

        let properties = self.properties().await.map_err(tracerr::wrap!())?;
        let mut matched = properties
            .iter()
            .filter(|p| filter.accepts(p))
            .collect::<Vec<_>>();
        matched.sort_by(|a, b| Self::compare(&sort, a, b));

        Ok(matched
            .into_iter()
            .skip(arguments.start_index())
            .take(arguments.limit())
            .cloned()
            .collect())
    }
}

impl Database<Select<By<location::list::TotalCount, GroupBy>>> for Memory {
    type Ok = location::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<location::list::TotalCount, GroupBy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let properties = self.properties().await.map_err(tracerr::wrap!())?;
        Ok(Self::group(&properties, by.into_inner()).len().into())
    }
}

impl Database<Select<By<Vec<Group>, location::list::Selector>>> for Memory {
    type Ok = Vec<Group>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Group>, location::list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        use location::list::Key;

        let location::list::Selector {
            group_by,
            sort,
            arguments,
        } = by.into_inner();

        let properties = self.properties().await.map_err(tracerr::wrap!())?;
        let mut groups = Self::group(&properties, group_by);
        groups.sort_by(|a, b| {
            sort.compare(a, b, |key, a, b| match key {
                Key::Name => a.name.cmp(&b.name),
                Key::Count => a.count.cmp(&b.count),
            })
        });

        Ok(groups
            .into_iter()
            .skip(arguments.start_index())
            .take(arguments.limit())
            .collect())
    }
}
