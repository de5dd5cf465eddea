use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod chain;
mod chains;
mod config;
mod contracts;
mod controllers;
mod dashboard;
mod flows;
mod gateway;
mod session;
mod wallet;

#[cfg(test)]
mod testing;

use chain::{ChainClient, EthersChainClient};
use config::Config;
use gateway::EventBroadcaster;
use session::SessionManager;

pub struct AppState {
    pub config: Config,
    pub chain: Arc<dyn ChainClient>,
    /// Chain id reported by the RPC node (or CHAIN_ID when it can't tell)
    pub chain_id: u64,
    pub broadcaster: Arc<EventBroadcaster>,
    pub sessions: Arc<SessionManager>,
    pub wallet_mode: Option<&'static str>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::other(e)
    })?;
    let port = config.port;

    // Wallet is optional: without one the dashboard is read-only
    let wallet_provider = wallet::create_wallet_provider().map_err(|e| {
        log::error!("Failed to load wallet: {}", e);
        std::io::Error::other(e)
    })?;
    let wallet = match &wallet_provider {
        Some(provider) => Some(provider.get_wallet().await.map_err(std::io::Error::other)?),
        None => None,
    };

    log::info!("Connecting to RPC at {}", config.rpc_url);
    let chain_client = EthersChainClient::connect(&config, wallet)
        .await
        .map_err(std::io::Error::other)?;
    let chain: Arc<dyn ChainClient> = Arc::new(chain_client);
    let chain_id = chain.chain_id().await.unwrap_or(config.chain_id);

    match config.voting_contract {
        Some(address) => log::info!("Voting contract at {:?}", address),
        None => log::warn!(
            "{} not set - voting disabled",
            config::env_vars::VOTING_CONTRACT_ADDRESS
        ),
    }

    let broadcaster = Arc::new(EventBroadcaster::new());

    log::info!("Mounting dashboard session");
    let sessions = SessionManager::start(
        chain.clone(),
        chain_id,
        config.voting_contract,
        broadcaster.clone(),
    )
    .await
    .map_err(std::io::Error::other)?;

    let frontend_dist = config.frontend_dist.clone();
    let app_state = web::Data::new(AppState {
        config,
        chain,
        chain_id,
        broadcaster: broadcaster.clone(),
        sessions: Arc::new(sessions),
        wallet_mode: wallet_provider.as_ref().map(|p| p.mode_name()),
    });
    let broadcaster_data = web::Data::new(broadcaster);

    log::info!("Starting dashboard server on port {}", port);
    log::info!("WebSocket events on ws://0.0.0.0:{}/ws", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let index_html = format!("{}/index.html", frontend_dist);

        App::new()
            .app_data(app_state.clone())
            .app_data(broadcaster_data.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::dashboard::config)
            .configure(controllers::transfer::config)
            .configure(controllers::voting::config)
            .configure(controllers::session::config)
            .configure(gateway::actix_ws::config)
            // Serve static files, with SPA fallback to index.html for client-side routing
            .service(
                Files::new("/", frontend_dist.as_str())
                    .index_file("index.html")
                    .default_handler(move |req: actix_web::dev::ServiceRequest| {
                        let (http_req, _payload) = req.into_parts();
                        let index_html = index_html.clone();
                        async move {
                            let response = NamedFile::open(index_html)?.into_response(&http_req);
                            Ok(actix_web::dev::ServiceResponse::new(http_req, response))
                        }
                    }),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
