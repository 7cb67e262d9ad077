//! Liveness reporting. Pure and infallible: if the process can answer at
//! all, it answers "healthy".

use serde::Serialize;

use crate::consts::GATEWAY_VERSION;
use crate::registry::EngineRegistry;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub jwt_auth_enabled: bool,
    pub gateway_version: &'static str,
    pub engines: Vec<String>,
}

pub fn report(auth_enabled: bool, registry: &EngineRegistry) -> HealthReport {
    HealthReport {
        status: "healthy",
        jwt_auth_enabled: auth_enabled,
        gateway_version: GATEWAY_VERSION,
        engines: registry.names(),
    }
}
