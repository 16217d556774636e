pub mod auth;
pub mod employee;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/v1/auth/signup").route(web::post().to(auth::signup)))
        .service(web::resource("/v1/auth/login").route(web::post().to(auth::login)))
        .service(
            web::resource("/v1/employee")
                .route(web::get().to(employee::get_employees))
                .route(web::post().to(employee::add_employee)),
        )
        .service(
            web::resource("/v1/employee/search").route(web::get().to(employee::search_employees)),
        )
        .service(
            web::resource("/v1/employee/{id}")
                .route(web::get().to(employee::search_employee_by_id))
                .route(web::patch().to(employee::update_employee))
                .route(web::delete().to(employee::delete_employee)),
        );
}
