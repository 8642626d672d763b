// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Production gate for seed-based routes.
//!
//! The gate runs as route middleware, ahead of body extraction, so a
//! mainnet request is refused with 403 whatever its body contains. The
//! operations behind it check the same gate again.
//!
//! ```rust,ignore
//! post(xrpl::payment).route_layer(axum::middleware::from_fn_with_state(
//!     SeedGate::new(network, GatedOperation::Payment),
//!     require_test_network,
//! ))
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::ledger::{assert_not_production, GatedOperation, Network};

/// Which operation a route performs, on which network.
#[derive(Debug, Clone, Copy)]
pub struct SeedGate {
    pub network: Network,
    pub operation: GatedOperation,
}

impl SeedGate {
    pub fn new(network: Network, operation: GatedOperation) -> Self {
        Self { network, operation }
    }
}

/// Reject the request on the production network.
pub async fn require_test_network(
    State(gate): State<SeedGate>,
    request: Request,
    next: Next,
) -> Response {
    match assert_not_production(gate.network, gate.operation) {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}
