//! [`Command`] definition.

pub mod create_property;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::create_property::CreateProperty;
