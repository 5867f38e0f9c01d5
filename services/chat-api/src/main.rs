use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use awc::Client;
use tracing::{info, warn};

use chat_api::{configure, AppState};
use shared::catalog::ModelCatalog;
use shared::config::Settings;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();
    let settings = Settings::new().expect("settings");

    info!("starting chat-api, probing configured models");
    let client = Client::default();
    let catalog = ModelCatalog::initialize(&client).await;
    if catalog.is_empty() {
        warn!("no models answered the probe; /generate will reject every request");
    }
    if let Err(e) = catalog.write_inventory(&settings.model_inventory_path) {
        warn!("could not write model inventory: {e}");
    }

    let state = AppState {
        settings: settings.clone(),
        catalog,
    };
    info!("chat-api listening on {}", settings.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Cors::permissive())
            .configure(configure)
    })
    .bind(&settings.bind_addr)?
    .run()
    .await
}
