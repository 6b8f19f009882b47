//! Full gate chain tests: rate gate ahead of auth, auth ahead of roles,
//! uniform short-circuit behavior across the pipeline.

use palisade_core::{
    AuthGate, ClientKey, GateChain, GateContext, GateError, Identity, RateGate, RateLimitConfig,
    RequestMeta, RoleGate, SlowdownConfig, TokenCodec,
};
use std::sync::Arc;
use std::time::Duration;

const SECRET: &str = "pipeline-secret";

fn identity(role: &str) -> Identity {
    Identity {
        subject: "user-1".to_string(),
        email: "user@example.com".to_string(),
        role: role.to_string(),
    }
}

fn chain(max_requests: u32, required_roles: &[&str]) -> (GateChain, Arc<TokenCodec>) {
    let codec = Arc::new(TokenCodec::new(SECRET));
    let chain = GateChain::new()
        .with(RateGate::new(
            RateLimitConfig::new(max_requests, Duration::from_secs(60)),
            SlowdownConfig {
                delay_after: u32::MAX,
                ..SlowdownConfig::default()
            },
            "/api",
        ))
        .with(AuthGate::new(codec.clone()))
        .with(RoleGate::new(required_roles.iter().copied()));
    (chain, codec)
}

fn authed_meta(codec: &TokenCodec, role: &str) -> RequestMeta {
    let token = codec
        .sign(&identity(role), Duration::from_secs(3600))
        .unwrap();
    RequestMeta::new("/api/orders", ClientKey::new("10.0.0.1"))
        .with_authorization(format!("Bearer {token}"))
}

#[test]
fn test_full_chain_allows_valid_request() {
    let (chain, codec) = chain(100, &["customer"]);
    let meta = authed_meta(&codec, "customer");

    let mut ctx = GateContext::default();
    let outcome = chain.evaluate(&meta, &mut ctx);

    assert!(outcome.allowed());
    assert_eq!(outcome.delay, Duration::ZERO);
    assert_eq!(ctx.identity, Some(identity("customer")));
}

#[test]
fn test_rate_gate_runs_before_auth() {
    let (chain, codec) = chain(1, &[]);
    let meta = authed_meta(&codec, "customer");

    let mut ctx = GateContext::default();
    assert!(chain.evaluate(&meta, &mut ctx).allowed());

    // Over the ceiling: a valid token still gets rate limited, and the
    // auth gate never runs, so no identity is attached
    let mut ctx = GateContext::default();
    let outcome = chain.evaluate(&meta, &mut ctx);
    assert!(matches!(outcome.result, Err(GateError::RateLimited { .. })));
    assert!(ctx.identity.is_none());
}

#[test]
fn test_unauthenticated_request_never_reaches_role_gate() {
    let (chain, _) = chain(100, &["admin"]);
    let meta = RequestMeta::new("/api/orders", ClientKey::new("10.0.0.1"));

    let mut ctx = GateContext::default();
    let outcome = chain.evaluate(&meta, &mut ctx);

    // 401 from the auth gate, not 403 from the role gate
    match outcome.result {
        Err(err) => assert_eq!(err.status(), 401),
        Ok(()) => panic!("expected rejection"),
    }
}

#[test]
fn test_wrong_role_forbidden_after_authentication() {
    let (chain, codec) = chain(100, &["admin", "staff"]);
    let meta = authed_meta(&codec, "customer");

    let mut ctx = GateContext::default();
    let outcome = chain.evaluate(&meta, &mut ctx);

    match outcome.result {
        Err(err) => assert_eq!(err.status(), 403),
        Ok(()) => panic!("expected rejection"),
    }
    // Identity was attached before the role gate rejected
    assert_eq!(ctx.identity, Some(identity("customer")));
}

#[test]
fn test_slowdown_delay_surfaces_through_chain() {
    let codec = Arc::new(TokenCodec::new(SECRET));
    let chain = GateChain::new()
        .with(RateGate::new(
            RateLimitConfig::new(100, Duration::from_secs(60)),
            SlowdownConfig {
                delay_after: 1,
                delay: Duration::from_millis(500),
                window: Duration::from_secs(60),
            },
            "/api",
        ))
        .with(AuthGate::new(codec.clone()));
    let meta = authed_meta(&codec, "customer");

    let mut ctx = GateContext::default();
    assert_eq!(chain.evaluate(&meta, &mut ctx).delay, Duration::ZERO);

    let mut ctx = GateContext::default();
    let outcome = chain.evaluate(&meta, &mut ctx);
    // Delayed but still allowed, and the auth gate still ran
    assert!(outcome.allowed());
    assert_eq!(outcome.delay, Duration::from_millis(500));
    assert!(ctx.identity.is_some());
}

#[test]
fn test_out_of_scope_path_skips_throttling_but_not_auth() {
    let (chain, _) = chain(1, &[]);
    let meta = RequestMeta::new("/health", ClientKey::new("10.0.0.1"));

    for _ in 0..5 {
        let mut ctx = GateContext::default();
        let outcome = chain.evaluate(&meta, &mut ctx);
        // Never rate limited off-scope, but still unauthenticated
        match outcome.result {
            Err(err) => assert_eq!(err.status(), 401),
            Ok(()) => panic!("expected rejection"),
        }
    }
}
