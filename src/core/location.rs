//! Position sources. A run cannot start without a position.

use async_trait::async_trait;
use thiserror::Error;

use crate::schema::coords::Coordinates;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("position access denied")]
    Denied,
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(Coordinates),
}

/// Supplies the player's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// A provider that always answers with the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coords: Coordinates::new(latitude, longitude),
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        if !self.coords.is_valid() {
            return Err(LocationError::InvalidCoordinates(self.coords));
        }
        Ok(self.coords)
    }
}

/// A provider with no position at all, e.g. when the host denied access.
#[derive(Debug, Clone, Copy)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Denied)
    }
}
