//! Read entities definitions.

pub mod location;
pub mod property;

pub use self::property::Record;
