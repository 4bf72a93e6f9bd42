//! Code generator integration tests.

use daedalus_core::{BranchCondition, ConditionOperator};
use daedalus_test::{NodeFixture, PipelineFixture};

fn api() -> PipelineFixture {
    PipelineFixture::new("Orders API")
        .node(NodeFixture::exception_handling("errors").with_defaults())
        .node(NodeFixture::https("https").with_defaults())
        .node(NodeFixture::cors("cors").with_defaults())
        .node(NodeFixture::authentication("authn").with_defaults())
        .node(NodeFixture::authorization("authz").config("policies", vec!["admin"]))
        .node(NodeFixture::rate_limiting("limiter").with_defaults())
        .node(NodeFixture::endpoint("orders", "GET", "/api/orders"))
}

#[test]
fn test_program_layout() {
    let code = api().generate_code().unwrap();

    let create = code.find("var builder = WebApplication.CreateBuilder(args);").unwrap();
    let auth = code.find("builder.Services.AddAuthentication(").unwrap();
    let build = code.find("var app = builder.Build();").unwrap();
    let use_auth = code.find("app.UseAuthentication();").unwrap();
    let map = code.find("app.MapGet(\"/api/orders\"").unwrap();
    let run = code.find("app.Run();").unwrap();

    assert!(create < auth);
    assert!(auth < build);
    assert!(build < use_auth);
    assert!(use_auth < map);
    assert!(map < run);
}

#[test]
fn test_every_registration_is_emitted() {
    let code = api().generate_code().unwrap();
    for expected in [
        "builder.Services.AddHttpsRedirection(",
        "builder.Services.AddCors(",
        "builder.Services.AddAuthorization(options =>",
        "options.AddPolicy(\"admin\"",
        "builder.Services.AddRateLimiter(",
    ] {
        assert!(code.contains(expected), "missing {expected} in:\n{code}");
    }
}

#[test]
fn test_code_follows_code_order() {
    // Code is a projection of source order; no hoisting.
    let code = PipelineFixture::new("order")
        .node(NodeFixture::endpoint("users", "GET", "/api/users"))
        .node(NodeFixture::custom("audit", "AuditMiddleware"))
        .generate_code()
        .unwrap();

    let map = code.find("app.MapGet(").unwrap();
    let audit = code.find("app.UseMiddleware<AuditMiddleware>();").unwrap();
    assert!(map < audit);
}

#[test]
fn test_branch_condition_expression() {
    let code = PipelineFixture::new("branch")
        .node(
            NodeFixture::routing("routing")
                .when(BranchCondition::path(ConditionOperator::StartsWith, "/admin"))
                .on_true([NodeFixture::authentication("admin-auth")]),
        )
        .generate_code()
        .unwrap();

    assert!(code.contains(
        "app.UseWhen(context => context.Request.Path.StartsWithSegments(\"/admin\"), branch =>"
    ));
    assert!(code.contains("    branch.UseAuthentication();"));
    assert!(code.contains("builder.Services.AddAuthentication("));
}
