use actix_files::Files;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use staffdir_backend::auth::token::TokenService;
use staffdir_backend::config::AppConfig;
use staffdir_backend::db;
use staffdir_backend::handlers;
use staffdir_backend::uploads::AttachmentStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to the database");
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize the database schema");

    let attachments = AttachmentStore::new(config.app_root.clone());
    let upload_dir = attachments.upload_dir();
    std::fs::create_dir_all(&upload_dir).expect("Failed to create the upload directory");

    let tokens = web::Data::new(TokenService::new(&config.jwt_secret));
    let attachments = web::Data::new(attachments);

    info!("Starting server at {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(tokens.clone())
            .app_data(attachments.clone())
            .configure(handlers::configure)
            .service(Files::new("/uploads", upload_dir.clone()))
    })
    .bind(config.bind_addr)?
    .run()
    .await
}
