//! Location-related read definitions.
//!
//! Locations are not stored on their own, but derived by grouping
//! [`Property`] records by their [`City`] or [`State`].

use serde::Serialize;
use strum::{Display, EnumString};

#[cfg(doc)]
use crate::domain::{
    property::{City, State},
    Property,
};
use crate::domain::property::Image;

/// Attribute [`Property`] records are grouped by into locations.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, Hash, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum GroupBy {
    /// Group by [`City`].
    City,

    /// Group by [`State`].
    State,
}

/// Location aggregated out of [`Property`] records.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Group {
    /// Name of this location.
    pub name: String,

    /// Number of [`Property`] records in this location.
    pub count: usize,

    /// Representative [`Image`] of this location.
    ///
    /// Only present for [`GroupBy::City`] locations. Taken from the earliest
    /// created [`Property`] of the location, if it has a non-empty one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

pub mod list {
    //! Location list definitions.

    use common::pagination::{self, Arguments, Limits, Order};
    use derive_more::{From, Into};
    use strum::EnumString;

    use super::{Group, GroupBy};

    /// A [`pagination::Page`] of [`Group`]s.
    pub type Page = pagination::Page<Group>;

    /// Sort of a location list.
    pub type Sort = pagination::Sort<Key>;

    /// Key a location list can be sorted by.
    #[derive(Clone, Copy, Debug, EnumString, Eq, Hash, PartialEq)]
    #[strum(serialize_all = "camelCase")]
    pub enum Key {
        /// [`Group::name`].
        Name,

        /// [`Group::count`].
        Count,
    }

    /// Selector of a location list.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub struct Selector {
        /// [`GroupBy`] attribute of the locations.
        pub group_by: GroupBy,

        /// [`Sort`] of the locations.
        pub sort: Sort,

        /// Pagination [`Arguments`].
        pub arguments: Arguments,
    }

    impl Selector {
        /// Builds a [`Selector`] out of the raw client input.
        ///
        /// Never fails, falling back to defaults on malformed input.
        ///
        /// Cities are sorted by [`Key::Count`] descending by default, while
        /// states by [`Key::Name`] ascending. Ties are always broken by
        /// [`Key::Name`] ascending.
        #[must_use]
        pub fn build(
            group_by: GroupBy,
            sort: Option<&str>,
            page: Option<&str>,
            limit: Option<&str>,
            limits: Limits,
        ) -> Self {
            let mut keys = sort
                .and_then(|s| Sort::parse(s, |k| k.parse().ok()))
                .map_or_else(
                    || Self::default_keys(group_by),
                    |s| s.keys().to_vec(),
                );
            if keys.iter().all(|(k, _)| *k != Key::Name) {
                keys.push((Key::Name, Order::Ascending));
            }

            Self {
                group_by,
                sort: Sort::new(keys).unwrap_or_else(Self::fallback_sort),
                arguments: Arguments::parse(page, limit, limits),
            }
        }

        /// Returns the default sort keys for the provided [`GroupBy`].
        fn default_keys(group_by: GroupBy) -> Vec<(Key, Order)> {
            match group_by {
                GroupBy::City => vec![(Key::Count, Order::Descending)],
                GroupBy::State => vec![(Key::Name, Order::Ascending)],
            }
        }

        /// Returns a [`Sort`] by [`Key::Name`] ascending.
        fn fallback_sort() -> Sort {
            Sort::new([(Key::Name, Order::Ascending)]).expect("non-empty")
        }
    }

    /// Total count of locations in a list.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(usize);

    #[cfg(test)]
    mod spec {
        use common::pagination::{Arguments, Limits, Order};

        use super::{GroupBy, Key, Selector};

        #[test]
        fn default_sorts() {
            let cities =
                Selector::build(GroupBy::City, None, None, None, Limits::default());
            assert_eq!(
                cities.sort.keys(),
                [(Key::Count, Order::Descending), (Key::Name, Order::Ascending)],
            );
            assert_eq!(cities.arguments, Arguments::default());

            let states = Selector::build(
                GroupBy::State,
                Some("nonsense"),
                Some("0"),
                Some("x"),
                Limits::default(),
            );
            assert_eq!(states.sort.keys(), [(Key::Name, Order::Ascending)]);
            assert_eq!(states.arguments, Arguments::default());
        }

        #[test]
        fn requested_sort() {
            let selector = Selector::build(
                GroupBy::City,
                Some("-name,count"),
                Some("2"),
                Some("5"),
                Limits::default(),
            );
            assert_eq!(
                selector.sort.keys(),
                [(Key::Name, Order::Descending), (Key::Count, Order::Ascending)],
            );
            assert_eq!(selector.arguments, Arguments::new(2, 5).unwrap());
        }
    }
}
