//! One handler per middleware kind.
//!
//! | Kind                 | Simulation                                         |
//! |----------------------|----------------------------------------------------|
//! | `Authentication`     | 401 unless authenticated or credentials present    |
//! | `Authorization`      | 403 unless a listed policy is a claim key          |
//! | `Routing`            | 404 unless a configured route matches              |
//! | `CORS`               | 403 for a disallowed `Origin`                      |
//! | `StaticFiles`        | 200 for static asset paths                         |
//! | `ExceptionHandling`  | no-op                                              |
//! | `Compression`        | negotiates `Content-Encoding`                      |
//! | `RateLimiting`       | 429 once a policy's counter exceeds its limit      |
//! | `HTTPS`              | adds HSTS                                          |
//! | `Custom`             | reports the configured class                       |
//! | `MinimalAPIEndpoint` | 200 on method and path match                       |

mod authentication;
mod authorization;
mod compression;
mod cors;
mod custom;
mod endpoint;
mod exception_handling;
mod https;
mod rate_limiting;
mod routing;
mod static_files;

pub use authentication::AuthenticationHandler;
pub use authorization::AuthorizationHandler;
pub use compression::CompressionHandler;
pub use cors::CorsHandler;
pub use custom::CustomHandler;
pub use endpoint::EndpointHandler;
pub use exception_handling::ExceptionHandlingHandler;
pub use https::HttpsHandler;
pub use rate_limiting::RateLimitingHandler;
pub use routing::RoutingHandler;
pub use static_files::StaticFilesHandler;
