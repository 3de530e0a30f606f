//! Abstractions for offset pagination.

use std::cmp::Ordering;

/// Default number of items on a [`Page`].
pub const DEFAULT_LIMIT: usize = 10;

/// Default upper bound of items on a [`Page`].
pub const DEFAULT_MAX_LIMIT: usize = 100;

/// Bounds applied to a client-requested [`Arguments::limit()`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Limits {
    /// Limit used when none (or an invalid one) is requested.
    pub default: usize,

    /// Maximum allowed limit.
    pub max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default: DEFAULT_LIMIT,
            max: DEFAULT_MAX_LIMIT,
        }
    }
}

/// Pagination arguments.
///
/// Both `page` and `limit` are always at least `1`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Arguments {
    /// 1-based number of the requested page.
    page: usize,

    /// Maximum number of items on the requested page.
    limit: usize,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Arguments {
    /// Creates new [`Arguments`].
    ///
    /// [`None`] is returned if either `page` or `limit` is zero.
    #[must_use]
    pub const fn new(page: usize, limit: usize) -> Option<Self> {
        if page == 0 || limit == 0 {
            return None;
        }
        Some(Self { page, limit })
    }

    /// Parses [`Arguments`] out of the raw client input.
    ///
    /// Never fails: missing, non-numeric, zero or negative values fall back to
    /// page `1` and [`Limits::default`], and a too large `limit` is cut down to
    /// [`Limits::max`].
    #[must_use]
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        limits: Limits,
    ) -> Self {
        fn positive(input: Option<&str>) -> Option<usize> {
            input
                .and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
        }

        let max = limits.max.max(1);
        Self {
            page: positive(page).unwrap_or(1),
            limit: positive(limit)
                .unwrap_or(limits.default)
                .clamp(1, max),
        }
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Returns the maximum number of items on the page.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of items to skip before the page starts.
    #[must_use]
    pub const fn start_index(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Order of items.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Order {
    /// Ascending order.
    Ascending,

    /// Descending order.
    Descending,
}

impl Order {
    /// Applies this [`Order`] to an ascending [`Ordering`].
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }

    #[cfg(feature = "postgres")]
    /// Returns SQL keyword representing this [`Order`].
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Ordered list of sort keys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sort<K> {
    /// Keys to sort by, most significant first.
    keys: Vec<(K, Order)>,
}

impl<K> Sort<K> {
    /// Creates a new [`Sort`] by the provided keys.
    ///
    /// [`None`] is returned if no keys provided.
    pub fn new(keys: impl IntoIterator<Item = (K, Order)>) -> Option<Self> {
        let keys = keys.into_iter().collect::<Vec<_>>();
        (!keys.is_empty()).then_some(Self { keys })
    }

    /// Parses a comma-separated `input` like `-price,title`, where a leading
    /// `-` means [`Order::Descending`].
    ///
    /// Keys not recognized by `key` are skipped, as well as repeated ones.
    /// [`None`] is returned if nothing recognizable remains.
    pub fn parse(input: &str, key: impl Fn(&str) -> Option<K>) -> Option<Self>
    where
        K: PartialEq,
    {
        let mut keys: Vec<(K, Order)> = Vec::new();
        for part in input.split(',').map(str::trim) {
            let (name, order) = match part.strip_prefix('-') {
                Some(name) => (name, Order::Descending),
                None => (part.strip_prefix('+').unwrap_or(part), Order::Ascending),
            };
            if let Some(k) = key(name) {
                if keys.iter().all(|(existing, _)| *existing != k) {
                    keys.push((k, order));
                }
            }
        }
        Self::new(keys)
    }

    /// Returns the keys of this [`Sort`], most significant first.
    #[must_use]
    pub fn keys(&self) -> &[(K, Order)] {
        &self.keys
    }

    /// Compares two items key by key.
    pub fn compare<T, C>(&self, a: &T, b: &T, cmp: C) -> Ordering
    where
        C: Fn(&K, &T, &T) -> Ordering,
    {
        self.keys
            .iter()
            .map(|(k, order)| order.apply(cmp(k, a, b)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// A page of items, along with the information required to navigate
/// neighbouring pages.
#[derive(Clone, Debug)]
pub struct Page<T> {
    /// Items on this [`Page`].
    pub items: Vec<T>,

    /// Total number of items matching the same filter, across all pages.
    pub total: usize,

    /// [`Arguments`] this [`Page`] was selected with.
    pub arguments: Arguments,
}

impl<T> Page<T> {
    /// Creates a new [`Page`].
    #[must_use]
    pub fn new(arguments: Arguments, items: Vec<T>, total: usize) -> Self {
        Self {
            items,
            total,
            arguments,
        }
    }

    /// Returns [`Arguments`] of the next page, if there is one.
    #[must_use]
    pub fn next(&self) -> Option<Arguments> {
        let Arguments { page, limit } = self.arguments;
        (self.arguments.start_index().saturating_add(limit) < self.total)
            .then_some(Arguments {
                page: page + 1,
                limit,
            })
    }

    /// Returns [`Arguments`] of the previous page, if there is one.
    #[must_use]
    pub fn prev(&self) -> Option<Arguments> {
        let Arguments { page, limit } = self.arguments;
        (self.arguments.start_index() > 0).then_some(Arguments {
            page: page - 1,
            limit,
        })
    }

    /// Returns total number of pages.
    ///
    /// It's `0` when nothing matches.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.arguments.limit)
    }

    /// Maps items of this [`Page`] with the provided function.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            arguments: self.arguments,
        }
    }
}

#[cfg(feature = "serde")]
pub use self::envelope::{Envelope, Link, Links};

#[cfg(feature = "serde")]
mod envelope {
    //! Serializable response shape of a [`Page`].

    use serde::Serialize;

    use super::{Arguments, Page};

    /// Response envelope of a [`Page`].
    #[derive(Clone, Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Envelope<T> {
        /// Always `true`, as failures are rendered differently.
        pub success: bool,

        /// Number of items in [`Envelope::data`].
        pub count: usize,

        /// Links to the neighbouring pages.
        pub pagination: Links,

        /// Total number of pages.
        pub total_pages: usize,

        /// Total number of matching items.
        pub total: usize,

        /// Items of the page.
        pub data: Vec<T>,
    }

    /// Links to the pages neighbouring a [`Page`].
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
    pub struct Links {
        /// Next page, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub next: Option<Link>,

        /// Previous page, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub prev: Option<Link>,
    }

    /// Link to a page.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
    pub struct Link {
        /// 1-based page number.
        pub page: usize,

        /// Page size.
        pub limit: usize,
    }

    impl From<Arguments> for Link {
        fn from(args: Arguments) -> Self {
            Self {
                page: args.page(),
                limit: args.limit(),
            }
        }
    }

    impl<T> From<Page<T>> for Envelope<T> {
        fn from(page: Page<T>) -> Self {
            let pagination = Links {
                next: page.next().map(Into::into),
                prev: page.prev().map(Into::into),
            };
            let total_pages = page.total_pages();
            let Page { items, total, .. } = page;
            Self {
                success: true,
                count: items.len(),
                pagination,
                total_pages,
                total,
                data: items,
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use std::cmp::Ordering;

    use super::{Arguments, Limits, Order, Page, Sort};

    fn args(page: usize, limit: usize) -> Arguments {
        Arguments::new(page, limit).unwrap()
    }

    #[test]
    fn start_index() {
        assert_eq!(args(1, 10).start_index(), 0);
        assert_eq!(args(2, 10).start_index(), 10);
        assert_eq!(args(3, 7).start_index(), 14);
        assert_eq!(args(usize::MAX, 2).start_index(), usize::MAX);
    }

    #[test]
    fn rejects_zero() {
        assert!(Arguments::new(0, 10).is_none());
        assert!(Arguments::new(1, 0).is_none());
    }

    #[test]
    fn parses_fail_soft() {
        let limits = Limits::default();

        assert_eq!(Arguments::parse(None, None, limits), args(1, 10));
        assert_eq!(
            Arguments::parse(Some("abc"), Some("-5"), limits),
            args(1, 10),
        );
        assert_eq!(Arguments::parse(Some("0"), Some("0"), limits), args(1, 10));
        assert_eq!(
            Arguments::parse(Some(" 3 "), Some("25"), limits),
            args(3, 25),
        );
        assert_eq!(Arguments::parse(Some("2.5"), None, limits), args(1, 10));
        assert_eq!(
            Arguments::parse(None, Some("100000"), limits),
            args(1, 100),
        );
        assert_eq!(
            Arguments::parse(None, None, Limits { default: 5, max: 3 }),
            args(1, 3),
        );
    }

    #[test]
    fn next_and_prev() {
        let page = Page::new(args(1, 10), vec![(); 10], 25);
        assert_eq!(page.next(), Some(args(2, 10)));
        assert_eq!(page.prev(), None);

        let page = Page::new(args(2, 10), vec![(); 10], 25);
        assert_eq!(page.next(), Some(args(3, 10)));
        assert_eq!(page.prev(), Some(args(1, 10)));

        let page = Page::new(args(3, 10), vec![(); 5], 25);
        assert_eq!(page.next(), None);
        assert_eq!(page.prev(), Some(args(2, 10)));

        let page = Page::new(args(2, 10), Vec::<()>::new(), 20);
        assert_eq!(page.next(), None);

        let page = Page::new(args(5, 10), Vec::<()>::new(), 0);
        assert_eq!(page.next(), None);
        assert_eq!(page.prev(), Some(args(4, 10)));
    }

    #[test]
    fn total_pages() {
        for (total, limit, expected) in
            [(0, 10, 0), (1, 10, 1), (10, 10, 1), (11, 10, 2), (25, 7, 4)]
        {
            let page = Page::new(args(1, limit), Vec::<()>::new(), total);
            assert_eq!(page.total_pages(), expected, "{total}/{limit}");
        }
    }

    #[test]
    fn sort_parsing() {
        let key = |s: &str| ["a", "b", "c"].contains(&s).then(|| s.to_owned());

        let sort = Sort::parse("-a, b,+c", key).unwrap();
        assert_eq!(
            sort.keys(),
            [
                ("a".to_owned(), Order::Descending),
                ("b".to_owned(), Order::Ascending),
                ("c".to_owned(), Order::Ascending),
            ],
        );

        let sort = Sort::parse("x,-b,b", key).unwrap();
        assert_eq!(sort.keys(), [("b".to_owned(), Order::Descending)]);

        assert!(Sort::parse("", key).is_none());
        assert!(Sort::parse("x,-y", key).is_none());
    }

    #[test]
    fn sort_compares_by_keys() {
        let sort = Sort::new([(0, Order::Descending), (1, Order::Ascending)])
            .unwrap();
        let cmp = |k: &usize, a: &(u8, u8), b: &(u8, u8)| match k {
            0 => a.0.cmp(&b.0),
            _ => a.1.cmp(&b.1),
        };

        assert_eq!(sort.compare(&(2, 0), &(1, 0), cmp), Ordering::Less);
        assert_eq!(sort.compare(&(1, 1), &(1, 2), cmp), Ordering::Less);
        assert_eq!(sort.compare(&(1, 1), &(1, 1), cmp), Ordering::Equal);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn envelope_shape() {
        use serde_json::json;

        use super::Envelope;

        let envelope = Envelope::from(Page::new(args(2, 2), vec![3, 4], 5));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "success": true,
                "count": 2,
                "pagination": {
                    "next": { "page": 3, "limit": 2 },
                    "prev": { "page": 1, "limit": 2 },
                },
                "totalPages": 3,
                "total": 5,
                "data": [3, 4],
            }),
        );

        let envelope = Envelope::from(Page::new(args(1, 10), Vec::<u8>::new(), 0));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "success": true,
                "count": 0,
                "pagination": {},
                "totalPages": 0,
                "total": 0,
                "data": [],
            }),
        );
    }
}
