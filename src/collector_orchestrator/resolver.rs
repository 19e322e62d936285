//! Router/unit resolution for position updates

use std::sync::Arc;
use tracing::debug;

use crate::legacy_store::{RouterRepository, UnitRepository};

/// Outcome of resolving an IMEI against the legacy tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    pub is_vehicle: bool,
    pub router_id: i64,
    pub unit_id: i64,
}

/// Looks up the router and unit behind an IMEI.
///
/// Lookup failures never propagate: a missing or unreadable router/unit
/// resolves to `Resolution::default()`, which callers read as "no position
/// update needed".
pub struct RouterResolver {
    routers: Arc<dyn RouterRepository>,
    units: Arc<dyn UnitRepository>,
}

impl RouterResolver {
    pub fn new(routers: Arc<dyn RouterRepository>, units: Arc<dyn UnitRepository>) -> Self {
        Self { routers, units }
    }

    pub async fn resolve(&self, imei: Option<&str>) -> Resolution {
        let Some(imei) = imei.filter(|i| !i.is_empty()) else {
            return Resolution::default();
        };

        let router = match self.routers.find_by_imei(imei).await {
            Ok(router) => router,
            Err(e) => {
                debug!(imei, error = %e, "Router not resolved");
                return Resolution::default();
            }
        };

        let unit = match self.units.find_by_router_id(router.id).await {
            Ok(unit) => unit,
            Err(e) => {
                debug!(imei, router_id = router.id, error = %e, "Unit not resolved");
                return Resolution::default();
            }
        };

        Resolution {
            is_vehicle: unit.is_vehicle,
            router_id: router.id,
            unit_id: unit.id,
        }
    }
}
