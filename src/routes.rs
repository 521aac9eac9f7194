use crate::{
    api::{attendance, calendar, employee, schedule},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("").route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/classify")
                            .route(web::post().to(attendance::classify_preview)),
                    )
                    .service(
                        web::resource("/evaluate").route(web::post().to(attendance::evaluate)),
                    )
                    .service(
                        web::resource("/recalculate")
                            .route(web::post().to(attendance::recalculate_range)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(attendance::get_attendance)),
                    ),
            )
            .service(
                web::scope("/schedule")
                    // /schedule
                    .service(
                        web::resource("")
                            .route(web::post().to(schedule::create_schedule))
                            .route(web::get().to(schedule::list_schedules)),
                    )
                    // /schedule/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(schedule::get_schedule))
                            .route(web::put().to(schedule::update_schedule))
                            .route(web::delete().to(schedule::delete_schedule)),
                    ),
            )
            .service(
                web::scope("/calendar")
                    // /calendar
                    .service(
                        web::resource("")
                            .route(web::post().to(calendar::create_entry))
                            .route(web::get().to(calendar::list_entries)),
                    )
                    // /calendar/{id}
                    .service(
                        web::resource("/{id}").route(web::delete().to(calendar::delete_entry)),
                    ),
            )
            .service(
                web::scope("/employee")
                    // /employee
                    .service(web::resource("").route(web::post().to(employee::create_employee)))
                    // /employee/{id}
                    .service(web::resource("/{id}").route(web::get().to(employee::get_employee)))
                    // /employee/{id}/schedule
                    .service(
                        web::resource("/{id}/schedule")
                            .route(web::put().to(employee::update_employee_schedule)),
                    ),
            ),
    );
}
