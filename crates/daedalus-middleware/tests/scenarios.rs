//! End-to-end simulation scenarios.
//!
//! Each test builds a small pipeline, simulates a request against it and
//! checks the observable outcome: status code, terminating node and the
//! shape of the trace.

use daedalus_core::{document, BranchCondition, ConditionOperator, MiddlewareKind};
use daedalus_middleware::{simulate_pipeline, StepDecision};
use daedalus_test::{NodeFixture, PipelineFixture, RequestFixture};

fn jwt_pipeline() -> PipelineFixture {
    PipelineFixture::new("jwt").node(NodeFixture::authentication("authn").config("authScheme", "JwtBearer"))
}

#[test]
fn test_missing_bearer_token_is_unauthorized() {
    jwt_pipeline()
        .simulate(RequestFixture::get("/api/users"))
        .unwrap()
        .assert_status_code(401)
        .assert_terminated_by(MiddlewareKind::Authentication)
        .assert_header("WWW-Authenticate", "Bearer");
}

#[test]
fn test_bearer_token_continues_to_routing() {
    let trace = jwt_pipeline()
        .node(NodeFixture::routing("routing"))
        .simulate(RequestFixture::get("/api/users").bearer_token("header.payload.signature"))
        .unwrap();

    trace
        .assert_step_count(2)
        .assert_not_terminated()
        .assert_status_code(200);
    assert_eq!(trace.steps()[0].decision, StepDecision::Continue);
    assert!(trace.result().success);
}

#[test]
fn test_lowercase_authorization_header_is_accepted() {
    jwt_pipeline()
        .simulate(RequestFixture::get("/").header("authorization", "Bearer a.b.c"))
        .unwrap()
        .assert_not_terminated();
}

#[test]
fn test_malformed_token_is_unauthorized() {
    jwt_pipeline()
        .simulate(RequestFixture::get("/").bearer_token("not-a-jwt"))
        .unwrap()
        .assert_status_code(401);
}

#[test]
fn test_cookie_scheme() {
    let pipeline = PipelineFixture::new("cookie")
        .node(NodeFixture::authentication("authn").config("authScheme", "Cookie"));

    pipeline
        .simulate(RequestFixture::get("/").cookie(".AspNetCore.Cookies", "x"))
        .unwrap()
        .assert_not_terminated();
    pipeline
        .simulate(RequestFixture::get("/"))
        .unwrap()
        .assert_status_code(401);
}

#[test]
fn test_missing_policy_claim_is_forbidden() {
    PipelineFixture::new("authz")
        .node(NodeFixture::authorization("authz").config("policies", vec!["admin"]))
        .simulate(RequestFixture::get("/").claim("role", "user"))
        .unwrap()
        .assert_status_code(403)
        .assert_terminated_by(MiddlewareKind::Authorization);
}

#[test]
fn test_policy_matches_claim_key() {
    PipelineFixture::new("authz")
        .node(NodeFixture::authorization("authz").config("policies", vec!["admin"]))
        .simulate(RequestFixture::get("/").claim("admin", "false"))
        .unwrap()
        .assert_not_terminated();
}

#[test]
fn test_unknown_route_is_not_found() {
    PipelineFixture::new("routes")
        .node(NodeFixture::routing("routing").config("routes", vec!["/api/users", "/api/posts"]))
        .simulate(RequestFixture::get("/api/invalid"))
        .unwrap()
        .assert_status_code(404)
        .assert_terminated_by(MiddlewareKind::Routing);
}

#[test]
fn test_endpoint_runs_after_later_middleware() {
    let trace = PipelineFixture::new("reorder")
        .node(NodeFixture::endpoint("users", "GET", "/api/users"))
        .node(NodeFixture::custom("custom", "AuditMiddleware"))
        .simulate(RequestFixture::get("/api/users"))
        .unwrap();

    let custom = trace.step_index("custom", StepDecision::Continue).unwrap();
    let matched = trace.step_index("users", StepDecision::Terminate).unwrap();
    assert!(custom < matched);

    let note = trace.step_mentioning(&["Code order", "Execution order"]).unwrap();
    assert_eq!(trace.steps()[note].middleware_type, None);
    let first_endpoint_step = trace
        .steps()
        .iter()
        .position(|step| step.middleware_type == Some(MiddlewareKind::MinimalApiEndpoint))
        .unwrap();
    assert!(custom < first_endpoint_step);
    assert!(trace
        .result()
        .steps_for("users")
        .all(|step| !step.action.contains("Code order")));
    trace
        .assert_step_mentioning(&["Code order", "Execution order"])
        .assert_status_code(200)
        .assert_terminated_by(MiddlewareKind::MinimalApiEndpoint);
}

#[test]
fn test_no_reorder_note_when_middleware_comes_first() {
    PipelineFixture::new("in-order")
        .node(NodeFixture::custom("custom", "AuditMiddleware"))
        .node(NodeFixture::endpoint("users", "GET", "/api/users"))
        .simulate(RequestFixture::get("/api/users"))
        .unwrap()
        .assert_no_step_mentioning(&["Code order", "Execution order"])
        .assert_decisions(&[StepDecision::Continue, StepDecision::Terminate, StepDecision::Info]);
}

#[test]
fn test_unmatched_endpoint_falls_through() {
    PipelineFixture::new("miss")
        .node(NodeFixture::endpoint("users", "GET", "/api/users"))
        .simulate(RequestFixture::post("/api/users"))
        .unwrap()
        .assert_not_terminated()
        .assert_status_code(200);
}

#[test]
fn test_rate_limit_accumulates_across_requests() {
    let trace = PipelineFixture::new("limits")
        .node(
            NodeFixture::rate_limiting("limiter")
                .config("permitLimit", 3)
                .config("policyName", "p"),
        )
        .simulate_repeated(RequestFixture::get("/"), 5)
        .unwrap();

    trace
        .assert_iteration_statuses(&[200, 200, 200, 429, 429])
        .assert_status_code(429)
        .assert_terminated_by(MiddlewareKind::RateLimiting)
        .assert_step_mentioning(&["Request #4"]);
    assert!(!trace.result().success);
}

#[test]
fn test_rate_limit_state_is_per_call() {
    let fixture = PipelineFixture::new("limits").node(
        NodeFixture::rate_limiting("limiter")
            .config("permitLimit", 1)
            .config("policyName", "p"),
    );

    fixture.simulate(RequestFixture::get("/")).unwrap().assert_status_code(200);
    fixture.simulate(RequestFixture::get("/")).unwrap().assert_status_code(200);
}

#[test]
fn test_cors_rejects_foreign_origin() {
    let fixture = PipelineFixture::new("cors")
        .node(NodeFixture::cors("cors").config("allowedOrigins", vec!["https://example.com"]));

    fixture
        .simulate(RequestFixture::get("/").origin("https://evil.com"))
        .unwrap()
        .assert_status_code(403)
        .assert_terminated_by(MiddlewareKind::Cors);

    let allowed = fixture
        .simulate(RequestFixture::get("/").origin("https://example.com"))
        .unwrap();
    allowed
        .assert_decisions(&[StepDecision::Continue])
        .assert_header("Access-Control-Allow-Origin", "https://example.com");
}

#[test]
fn test_static_file_short_circuits() {
    PipelineFixture::new("static")
        .node(NodeFixture::static_files("static"))
        .node(NodeFixture::routing("routing").config("routes", vec!["/api/*"]))
        .simulate(RequestFixture::get("/css/site.css"))
        .unwrap()
        .assert_status_code(200)
        .assert_terminated_by(MiddlewareKind::StaticFiles)
        .assert_step_count(1);
}

#[test]
fn test_branch_on_claim() {
    let fixture = PipelineFixture::new("branch").node(
        NodeFixture::custom("tenant", "TenantMiddleware")
            .when(BranchCondition::claim("tier", ConditionOperator::Equals, "gold"))
            .on_true([NodeFixture::custom("gold", "GoldMiddleware")])
            .on_false([NodeFixture::rate_limiting("limiter").config("permitLimit", 0)]),
    );

    let gold = fixture
        .simulate(RequestFixture::get("/").claim("tier", "gold"))
        .unwrap();
    gold.assert_not_terminated();
    assert!(gold.step_index("tenant", StepDecision::TrueBranch).is_some());
    assert!(gold.step_index("gold", StepDecision::Continue).is_some());

    fixture
        .simulate(RequestFixture::get("/"))
        .unwrap()
        .assert_status_code(429);
}

#[test]
fn test_hsts_and_compression_headers() {
    PipelineFixture::new("headers")
        .node(NodeFixture::https("https").with_defaults())
        .node(NodeFixture::compression("compression").with_defaults())
        .simulate(RequestFixture::get("/").accept_encoding("gzip, br"))
        .unwrap()
        .assert_not_terminated()
        .assert_header("Strict-Transport-Security", "max-age=31536000; includeSubDomains")
        .assert_header("Vary", "Accept-Encoding");
}

#[test]
fn test_imported_document_simulates() {
    let json = r#"{
        "id": "p1",
        "name": "Imported",
        "middlewares": [
            {"id": "auth", "type": "Authentication", "order": 0, "config": {"authScheme": "JwtBearer"}},
            {"id": "routes", "type": "Routing", "order": 1, "config": {"routes": ["/api/*"]}}
        ]
    }"#;
    let pipeline = document::import_from_json(json).unwrap();
    let request = RequestFixture::get("/api/users").bearer_token("h.p.s").build();

    let result = simulate_pipeline(&pipeline, &request, 1).unwrap();
    assert!(result.success);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.iterations[0].request_number, 1);
}
