// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    custody::{InitializedIssuer, IssuerSecrets, SetupStep, StepStatus},
    ledger::{
        keys::{GeneratedWallet, KeyAlgorithm},
        queries::{AccountState, BookOffer, Holder, TrustLine},
        GatedOperation, Network, TxOutcome,
    },
    operations::OfferAmount,
    signing::{CreatedPayload, SigningResult, SigningState},
    state::AppState,
    storage::{
        Event, EventType, StoredIssuer, StoredToken, StoredWallet, TrustlineRequest,
        TrustlineStatus,
    },
};

pub mod dex;
pub mod events;
pub mod gate;
pub mod health;
pub mod issuer;
pub mod onboard;
pub mod tokens;
pub mod trustlines;
pub mod wallets;
pub mod xrpl;

use gate::{require_test_network, SeedGate};

pub fn router(state: AppState) -> Router {
    let network = state.ledger.network();
    let seed = |operation: GatedOperation| SeedGate::new(network, operation);

    let routes = Router::new()
        // Service
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/status", get(health::status))
        // Issuer and registry
        .route("/issuer", get(issuer::get_issuer))
        .route("/issuer/init", post(issuer::init_issuer))
        .route("/.well-known/xrp-ledger.toml", get(issuer::xrp_ledger_toml))
        .route("/tokens", get(tokens::list_tokens).post(tokens::create_token))
        .route("/wallets", get(wallets::list_wallets).post(wallets::create_wallet))
        // Ledger reads
        .route("/xrpl/network", get(xrpl::network))
        .route("/xrpl/account/{address}", get(xrpl::account))
        .route("/xrpl/lines/{address}", get(xrpl::lines))
        .route("/holders", get(xrpl::holders))
        .route("/dex/book", get(dex::book))
        // Seed-based operations, refused on the production network
        .route(
            "/faucet",
            post(xrpl::faucet).route_layer(from_fn_with_state(
                seed(GatedOperation::Faucet),
                require_test_network,
            )),
        )
        .route(
            "/xrpl/payment",
            post(xrpl::payment).route_layer(from_fn_with_state(
                seed(GatedOperation::Payment),
                require_test_network,
            )),
        )
        .route(
            "/xrpl/trustline",
            post(xrpl::trustline).route_layer(from_fn_with_state(
                seed(GatedOperation::Trustline),
                require_test_network,
            )),
        )
        .route(
            "/xrpl/issue",
            post(xrpl::issue).route_layer(from_fn_with_state(
                seed(GatedOperation::Issue),
                require_test_network,
            )),
        )
        .route(
            "/xrpl/redeem",
            post(xrpl::redeem).route_layer(from_fn_with_state(
                seed(GatedOperation::Redeem),
                require_test_network,
            )),
        )
        .route(
            "/dex/offers",
            post(dex::create_offer).route_layer(from_fn_with_state(
                seed(GatedOperation::OfferCreate),
                require_test_network,
            )),
        )
        .route(
            "/dex/offers/cancel",
            post(dex::cancel_offer).route_layer(from_fn_with_state(
                seed(GatedOperation::OfferCancel),
                require_test_network,
            )),
        )
        // Trustline requests
        .route(
            "/trustline-requests",
            get(trustlines::list_requests).post(trustlines::create_request),
        )
        .route(
            "/trustline-requests/{id}/approve",
            post(trustlines::approve_request),
        )
        .route(
            "/trustline-requests/{id}/reject",
            post(trustlines::reject_request),
        )
        // Wallet-app signing
        .route("/xumm/ping", get(onboard::ping))
        .route("/xumm/payload", post(onboard::create_payload))
        .route("/xumm/payload/{uuid}", get(onboard::get_payload))
        .route("/onboard/start", post(onboard::start))
        .route("/onboard/trustline", post(onboard::trustline))
        .route("/onboard/issue", post(onboard::issue))
        .route("/onboard/result/{uuid}", get(onboard::result))
        // Audit
        .route("/events", get(events::list_events))
        .route("/reports/tx.csv", get(events::tx_report))
        .route("/reports/holders.csv", get(events::holders_report))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::status,
        issuer::init_issuer,
        issuer::get_issuer,
        issuer::xrp_ledger_toml,
        tokens::create_token,
        tokens::list_tokens,
        wallets::create_wallet,
        wallets::list_wallets,
        xrpl::network,
        xrpl::account,
        xrpl::lines,
        xrpl::holders,
        xrpl::faucet,
        xrpl::payment,
        xrpl::trustline,
        xrpl::issue,
        xrpl::redeem,
        dex::create_offer,
        dex::cancel_offer,
        dex::book,
        trustlines::create_request,
        trustlines::list_requests,
        trustlines::approve_request,
        trustlines::reject_request,
        onboard::ping,
        onboard::create_payload,
        onboard::get_payload,
        onboard::start,
        onboard::trustline,
        onboard::issue,
        onboard::result,
        events::list_events,
        events::tx_report,
        events::holders_report
    ),
    components(
        schemas(
            Network,
            KeyAlgorithm,
            GeneratedWallet,
            TxOutcome,
            AccountState,
            TrustLine,
            Holder,
            BookOffer,
            OfferAmount,
            StoredIssuer,
            StoredToken,
            StoredWallet,
            TrustlineRequest,
            TrustlineStatus,
            InitializedIssuer,
            IssuerSecrets,
            SetupStep,
            StepStatus,
            CreatedPayload,
            SigningResult,
            SigningState,
            Event,
            EventType
        )
    ),
    tags(
        (name = "Health", description = "Liveness and service status"),
        (name = "Issuer", description = "Issuer lifecycle and attestation"),
        (name = "Tokens", description = "Token registry"),
        (name = "Wallets", description = "Wallet generation"),
        (name = "Ledger", description = "Ledger reads and seed-based operations"),
        (name = "DEX", description = "Offers and order books"),
        (name = "Trustlines", description = "Trustline request workflow"),
        (name = "Signing", description = "Wallet-app signing"),
        (name = "Events", description = "Audit log and reports")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::signing::UnconfiguredProvider;
    use crate::storage::{EventLog, EventQuery, IssuerRepository, TokenRepository};
    use crate::testing::TestApp;

    const COLD: &str = "rU6K7V3Po4snVhBBaU29sesqs2qTQJWDw1";
    const HOT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const HOLDER: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

    async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router(app.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Register an issuer and one token directly in storage.
    fn seed_token(app: &TestApp) -> StoredToken {
        let issuer = StoredIssuer {
            id: "issuer-1".into(),
            org_name: "Acme".into(),
            domain: None,
            cold_address: COLD.into(),
            hot_address: HOT.into(),
            delegates_to: HOT.into(),
            delegation_confirmed: true,
            network: app.state.ledger.network(),
            created_at: Utc::now(),
        };
        IssuerRepository::new(&app.state.db).create(&issuer).unwrap();
        let token = StoredToken::new(&issuer.id, "USD", "US Dollar", None).unwrap();
        TokenRepository::new(&app.state.db).create(&token).unwrap();
        token
    }

    #[tokio::test]
    async fn health_and_status() {
        let app = TestApp::new(Network::Devnet);

        let (status, body) = send_json(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send_json(&app, Method::GET, "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["network"], "devnet");
        assert_eq!(body["issuerInitialized"], false);
        assert_eq!(body["signingProvider"], "memory");
        assert_eq!(body["tokenCount"], 0);
    }

    #[tokio::test]
    async fn seed_routes_are_refused_on_mainnet_before_body_parsing() {
        let app = TestApp::new(Network::Mainnet);

        for uri in [
            "/faucet",
            "/xrpl/payment",
            "/xrpl/trustline",
            "/xrpl/issue",
            "/xrpl/redeem",
            "/dex/offers",
            "/dex/offers/cancel",
        ] {
            let (status, body) = send_json(&app, Method::POST, uri, Some(json!({}))).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert!(body["error"].as_str().unwrap().contains("mainnet"), "{uri}");
        }
        assert_eq!(app.mock.network_calls(), 0);
    }

    #[tokio::test]
    async fn seed_routes_validate_bodies_off_mainnet() {
        let app = TestApp::new(Network::Devnet);
        let (status, _) = send(&app, Method::POST, "/xrpl/payment", Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn reads_stay_open_on_mainnet() {
        let app = TestApp::new(Network::Mainnet);
        app.mock.seed_account(HOLDER, 25_000_000);

        let (status, body) = send_json(&app, Method::GET, &format!("/xrpl/account/{HOLDER}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balanceXrp"], "25");

        let (status, body) = send_json(&app, Method::GET, "/xrpl/network", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["network"], "mainnet");

        let (status, _) = send(&app, Method::GET, "/xrpl/account/not-an-address", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn issuer_and_token_registry() {
        let app = TestApp::new(Network::Devnet);

        let (status, _) = send(&app, Method::GET, "/issuer", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/tokens",
            Some(json!({ "code": "USD", "name": "US Dollar" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("not initialized"));

        seed_token(&app);
        let (status, body) = send_json(
            &app,
            Method::POST,
            "/tokens",
            Some(json!({ "code": "Unykorn", "name": "Unykorn Gold", "precision": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["code"], "Unykorn");
        assert_eq!(body["wireCurrency"].as_str().unwrap().len(), 40);

        let (status, body) = send_json(&app, Method::GET, "/tokens", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);

        let (status, bytes) = send(&app, Method::GET, "/.well-known/xrp-ledger.toml", None).await;
        assert_eq!(status, StatusCode::OK);
        let toml = String::from_utf8(bytes).unwrap();
        assert!(toml.contains(&format!("address = \"{COLD}\"")));
        assert_eq!(toml.matches("[[TOKENS]]").count(), 2);
    }

    #[tokio::test]
    async fn wallet_generation_returns_seed_once() {
        let app = TestApp::new(Network::Devnet);

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/wallets",
            Some(json!({ "spaceId": "space-1", "fund": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["keys"]["seed"].as_str().unwrap().starts_with('s'));
        assert_eq!(body["funded"], true);
        assert_eq!(app.mock.fund_calls(), 1);

        let (status, bytes) = send(&app, Method::GET, "/wallets?spaceId=space-1", None).await;
        assert_eq!(status, StatusCode::OK);
        let listing = String::from_utf8(bytes).unwrap();
        assert!(listing.contains("\"total\":1"));
        assert!(!listing.contains("seed"));

        let mainnet = TestApp::new(Network::Mainnet);
        let (status, _) = send(&mainnet, Method::POST, "/wallets", Some(json!({ "fund": true }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn trustline_requests_decide_once() {
        let app = TestApp::new(Network::Devnet);
        let token = seed_token(&app);

        let (status, _) = send(
            &app,
            Method::POST,
            "/trustline-requests",
            Some(json!({ "spaceId": "s1", "address": HOLDER, "tokenId": "missing" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, created) = send_json(
            &app,
            Method::POST,
            "/trustline-requests",
            Some(json!({ "spaceId": "s1", "address": HOLDER, "tokenId": token.id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = send_json(&app, Method::GET, "/trustline-requests", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);

        let approve = format!("/trustline-requests/{id}/approve");
        let (status, body) = send_json(&app, Method::POST, &approve, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "approved");

        let (status, _) = send(&app, Method::POST, &format!("/trustline-requests/{id}/reject"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, Method::POST, "/trustline-requests/nope/approve", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn signed_payload_is_logged_once() {
        let app = TestApp::new(Network::Mainnet);

        let (status, created) = send_json(&app, Method::POST, "/onboard/start", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let uuid = created["uuid"].as_str().unwrap().to_string();

        let (status, body) = send_json(&app, Method::GET, &format!("/onboard/result/{uuid}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "awaiting_signature");

        app.provider.resolve(&uuid, HOLDER, Some("ABCDEF")).await.unwrap();
        let (_, first) = send_json(&app, Method::GET, &format!("/onboard/result/{uuid}"), None).await;
        let (_, second) = send_json(&app, Method::GET, &format!("/xumm/payload/{uuid}"), None).await;
        assert_eq!(first["logged"], true);
        assert_eq!(second["logged"], false);
        assert_eq!(second["txid"], "ABCDEF");

        let signed = EventLog::new(&app.state.db)
            .query(&EventQuery {
                event_type: Some(EventType::XummSigned),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(signed.len(), 1);

        let (status, _) = send(&app, Method::GET, "/xumm/payload/unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn signing_routes_report_missing_provider() {
        let mut app = TestApp::new(Network::Mainnet);
        app.state.signing = Arc::new(UnconfiguredProvider);

        let (status, body) = send_json(&app, Method::GET, "/xumm/ping", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not configured"));

        let (status, _) = send(&app, Method::POST, "/onboard/start", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(EventLog::new(&app.state.db).query(&EventQuery::default()).unwrap().is_empty());

        let (_, body) = send_json(&app, Method::GET, "/status", None).await;
        assert_eq!(body["signingProvider"], "none");
    }

    #[tokio::test]
    async fn events_and_reports() {
        let app = TestApp::new(Network::Devnet);
        let (status, _) = send(&app, Method::POST, "/onboard/start", None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send_json(&app, Method::GET, "/events?type=signin&limit=5000", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["events"][0]["route"], "/onboard/start");

        let (status, _) = send(&app, Method::GET, "/events?type=mint", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, bytes) = send(&app, Method::GET, "/reports/tx.csv?type=signin", None).await;
        assert_eq!(status, StatusCode::OK);
        let csv = String::from_utf8(bytes).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.starts_with("timestamp,type,route,"));

        let (status, _) = send(&app, Method::GET, "/reports/holders.csv", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn holders_report_lists_cold_account_lines() {
        let app = TestApp::new(Network::Devnet);
        seed_token(&app);
        app.mock.set_lines(
            COLD,
            vec![
                json!({ "account": HOLDER, "currency": "USD", "balance": "-12.5", "limit": "0", "limit_peer": "1000" }),
                json!({ "account": HOT, "currency": "USD", "balance": "0", "limit": "0", "limit_peer": "1000" }),
            ],
        );

        let (status, bytes) = send(&app, Method::GET, "/reports/holders.csv?currency=USD", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            format!("holder,currency,balance,limit\n{HOLDER},USD,12.5,1000\n")
        );

        let (status, body) = send_json(&app, Method::GET, "/holders?includeZero=true", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["holders"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = TestApp::new(Network::Devnet);
        let (status, body) = send_json(&app, Method::GET, "/api-doc/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/onboard/result/{uuid}"].is_object());
    }
}
