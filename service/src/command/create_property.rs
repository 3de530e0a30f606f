//! [`Command`] for creating a new [`Property`].

use common::{operations::Insert, DateTime};
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Property`].
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// [`property::Title`] of a new [`Property`].
    pub title: property::Title,

    /// [`property::Description`] of a new [`Property`].
    pub description: property::Description,

    /// [`property::Price`] of a new [`Property`].
    pub price: property::Price,

    /// [`property::Kind`] of a new [`Property`].
    pub kind: property::Kind,

    /// [`property::ListingKind`] of a new [`Property`].
    pub listing: property::ListingKind,

    /// Number of bedrooms in a new [`Property`].
    pub bedrooms: property::Rooms,

    /// Number of bathrooms in a new [`Property`].
    pub bathrooms: property::Rooms,

    /// [`property::Area`] of a new [`Property`].
    pub area: property::Area,

    /// [`property::Address`] of a new [`Property`].
    pub address: property::Address,

    /// [`property::City`] of a new [`Property`].
    pub city: property::City,

    /// [`property::State`] of a new [`Property`].
    pub state: property::State,

    /// [`property::Image`]s of a new [`Property`].
    pub images: Vec<property::Image>,

    /// Indicator whether a new [`Property`] is featured.
    pub featured: bool,

    /// [`property::OwnerId`] of a new [`Property`].
    pub owner_id: property::OwnerId,
}

impl<Db> Command<CreateProperty> for Service<Db>
where
    Db: Database<Insert<Property>, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateProperty {
            title,
            description,
            price,
            kind,
            listing,
            bedrooms,
            bathrooms,
            area,
            address,
            city,
            state,
            images,
            featured,
            owner_id,
        } = cmd;

        let now = DateTime::now();
        let property = Property {
            id: property::Id::new(),
            title,
            description,
            price,
            kind,
            listing,
            bedrooms,
            bathrooms,
            area,
            address,
            city,
            state,
            images,
            featured,
            owner_id,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        self.database()
            .execute(Insert(property.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(property)
    }
}

/// Error of [`CreateProperty`] [`Command`] execution.
pub type ExecutionError = database::Error;
