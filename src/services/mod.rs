//! Business logic services

pub mod availability;
pub mod catalog;
pub mod loans;
pub mod renewal;

use std::sync::Arc;

use crate::{clock::Clock, repository::CatalogStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub availability: availability::AvailabilityService,
    pub loans: loans::LoansService,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Create all services on top of one catalog store
    pub fn new<S>(store: Arc<S>, policy: renewal::RenewalPolicy, clock: Arc<dyn Clock>) -> Self
    where
        S: CatalogStore + 'static,
    {
        Self {
            catalog: catalog::CatalogService::new(store.clone()),
            availability: availability::AvailabilityService::new(store.clone()),
            loans: loans::LoansService::new(store, policy, clock.clone()),
            clock,
        }
    }
}
