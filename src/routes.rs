use crate::{
    api::{admin, attendance, profile},
    auth::{
        handlers,
        middleware::{auth_middleware, require_admin},
    },
    config::Config,
    error::AppError,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{http::header, middleware::from_fn, web};
use anyhow::anyhow;

pub type Limiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-route rate limits. The limiter state lives inside each config and is
/// shared by every worker that builds a `Governor` from it.
pub struct RateLimits {
    pub login: Limiter,
    pub protected: Limiter,
}

fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} per minute"))
}

pub fn build_limits(config: &Config) -> anyhow::Result<RateLimits> {
    Ok(RateLimits {
        login: build_limiter(config.rate_login_per_min)?,
        protected: build_limiter(config.rate_protected_per_min)?,
    })
}

pub fn cors(config: &Config) -> Cors {
    config
        .cors_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limits: &RateLimits) {
    // Extractor failures answer with the usual {message} shape.
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Invalid JSON body: {err}")).into()
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Invalid path parameter: {err}")).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(format!("Invalid query string: {err}")).into()
    }));

    cfg.service(
        web::scope(api_prefix)
            // Public routes
            .service(
                web::scope("/auth").service(
                    web::resource("/login")
                        .wrap(Governor::new(&limits.login))
                        .route(web::post().to(handlers::login)),
                ),
            )
            // Admin routes: token first, then role
            .service(
                web::scope("/admin")
                    .wrap(from_fn(require_admin))
                    .wrap(from_fn(auth_middleware))
                    .wrap(Governor::new(&limits.protected))
                    // /admin/users
                    .service(
                        web::resource("/users")
                            .route(web::post().to(admin::create_employee))
                            .route(web::get().to(admin::list_employees)),
                    )
                    // /admin/users/{id}
                    .service(
                        web::resource("/users/{id}")
                            .route(web::put().to(admin::update_employee))
                            .route(web::delete().to(admin::delete_employee)),
                    )
                    // /admin/attendance/all
                    .service(
                        web::resource("/attendance/all")
                            .route(web::get().to(admin::all_attendance)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .wrap(from_fn(auth_middleware))
                    .wrap(Governor::new(&limits.protected))
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/status/today")
                            .route(web::get().to(attendance::status_today)),
                    )
                    .service(
                        web::resource("/my-records").route(web::get().to(attendance::my_records)),
                    )
                    .service(
                        web::resource("/my-summary").route(web::get().to(attendance::my_summary)),
                    )
                    .service(
                        web::resource("/mark-status")
                            .route(web::post().to(attendance::mark_status)),
                    ),
            )
            .service(
                web::scope("/profile")
                    .wrap(from_fn(auth_middleware))
                    .wrap(Governor::new(&limits.protected))
                    .service(
                        web::resource("/update-picture")
                            .route(web::post().to(profile::update_picture)),
                    ),
            ),
    );
}

// LOGIN
//  └─ token (1 hour, no refresh)

// API REQUEST
//  └─ Authorization: Bearer token

// LOGOUT
//  └─ client drops the token
