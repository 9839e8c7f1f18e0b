use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::SessionService;
use crate::configuration::{ApplicationSettings, JwtSettings, PolkaSettings};
use crate::logger::LoggerMiddleware;
use crate::middleware::{FileServerHits, HitCounter, JwtMiddleware};
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login,
    metrics, polka_webhook, refresh, reset, revoke, update_user,
};
use crate::storage::Storage;

/// Directory served under `/app`
const STATIC_FILES_DIR: &str = "./public";
const STATIC_FILES_PATH: &str = "/app";

pub fn run(
    listener: TcpListener,
    storage: Storage,
    application: ApplicationSettings,
    jwt_config: JwtSettings,
    polka: PolkaSettings,
) -> Result<Server, std::io::Error> {
    let session = web::Data::new(SessionService::new(
        storage.users.clone(),
        storage.refresh_tokens.clone(),
        jwt_config.clone(),
        polka.api_key,
    ));
    let storage = web::Data::new(storage);
    let application = web::Data::new(application);
    let hits = web::Data::new(FileServerHits::default());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())      // Standard logging
            .wrap(LoggerMiddleware)       // Custom logging
            .wrap(HitCounter::new(hits.clone(), STATIC_FILES_PATH))

            // Shared state
            .app_data(session.clone())
            .app_data(storage.clone())
            .app_data(application.clone())
            .app_data(hits.clone())

            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .service(
                        web::resource("/users")
                            .route(web::post().to(create_user))
                            // Protected (require JWT authentication)
                            .route(
                                web::put()
                                    .to(update_user)
                                    .wrap(JwtMiddleware::new(jwt_config.clone())),
                            ),
                    )
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    .service(
                        web::resource("/chirps")
                            .route(web::get().to(list_chirps))
                            .route(
                                web::post()
                                    .to(create_chirp)
                                    .wrap(JwtMiddleware::new(jwt_config.clone())),
                            ),
                    )
                    .service(
                        web::resource("/chirps/{chirp_id}")
                            .route(web::get().to(get_chirp))
                            .route(
                                web::delete()
                                    .to(delete_chirp)
                                    .wrap(JwtMiddleware::new(jwt_config.clone())),
                            ),
                    )
                    .route("/polka/webhooks", web::post().to(polka_webhook)),
            )
            .service(
                web::scope("/admin")
                    .route("/metrics", web::get().to(metrics))
                    .route("/reset", web::post().to(reset)),
            )

            // Static file serving
            .service(fs::Files::new(STATIC_FILES_PATH, STATIC_FILES_DIR).index_file("index.html"))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
