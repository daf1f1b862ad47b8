//! Route registrar - validation gate in front of the route table

use std::sync::Arc;

use oauthmux_core::{EndpointDefinition, EndpointKind, ValidationError};
use tracing::{debug, error, info};

use super::{Route, RouteTable};
use crate::middleware::MiddlewareChain;

/// Result of registering one endpoint slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Validated and added to the route table
    Registered,
    /// The server does not configure this endpoint
    Absent,
    /// The endpoint failed validation and was not added
    Invalid(ValidationError),
}

impl RegisterOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegisterOutcome::Registered)
    }
}

/// Validates endpoint definitions and installs the valid ones
#[derive(Clone)]
pub struct RouteRegistrar {
    table: Arc<dyn RouteTable>,
}

impl RouteRegistrar {
    pub fn new(table: Arc<dyn RouteTable>) -> Self {
        Self { table }
    }

    /// Register one endpoint slot of a server.
    ///
    /// Absent and invalid endpoints are skipped; neither is an error for the
    /// caller.
    pub fn register(
        &self,
        server: &str,
        kind: EndpointKind,
        endpoint: Option<&EndpointDefinition>,
        chain: &MiddlewareChain,
    ) -> RegisterOutcome {
        let Some(endpoint) = endpoint else {
            debug!(server = %server, kind = %kind, "[Registrar] Endpoint not configured, skipping");
            return RegisterOutcome::Absent;
        };

        debug!(
            server = %server,
            kind = %kind,
            listen_path = %endpoint.listen_path,
            "[Registrar] Registering endpoint"
        );

        if let Err(e) = endpoint.validate() {
            error!(
                server = %server,
                kind = %kind,
                listen_path = %endpoint.listen_path,
                error = %e,
                "[Registrar] Error when registering endpoint"
            );
            return RegisterOutcome::Invalid(e);
        }

        self.table.add(Route {
            server: server.to_string(),
            kind,
            endpoint: endpoint.clone(),
            chain: chain.clone(),
        });

        info!(
            server = %server,
            kind = %kind,
            listen_path = %endpoint.listen_path,
            links = chain.len(),
            "[Registrar] Endpoint registered"
        );
        RegisterOutcome::Registered
    }
}
