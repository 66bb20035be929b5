use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpListener;
use tracing::{error, info};

use server::handlers::http::build_api_router;
use server::token::TokenKeys;
use server::{AppState, database, keys};
use shared::config::load_config;
use shared::types::server_config::AppConfig;
use shared::validation::Rules;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        load_config(&config_path)?
    } else {
        info!("No config file at {}, using defaults", config_path);
        AppConfig::default()
    };

    let db = database::create::open_database(&config.database.path)
        .await
        .context("Failed to open database")?;

    // No key, no service: a generation or persistence failure aborts startup
    // before the listener binds.
    let signing_key = keys::load_or_create_key(&config.auth.key_path)?;
    let mac_secret = keys::derive_mac_secret(&signing_key)?;

    let state = AppState {
        db,
        config: Arc::new(config),
        keys: Arc::new(TokenKeys::from_secret(&mac_secret)),
        rules: Arc::new(Rules::default()),
    };

    let router = Arc::new(build_api_router());

    let addr = state.config.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let router = router.clone();
        let state = state.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let router = router.clone();
                let state = state.clone();
                async move {
                    match router.route(req, state).await {
                        Ok(response) => Ok::<_, Infallible>(response),
                        Err(e) => {
                            error!("Handler error: {:#}", e);
                            Ok(internal_error_response())
                        }
                    }
                }
            });

            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, service)
                .await
            {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

/// Last-resort 500 for handler errors that escaped their own mapping.
fn internal_error_response() -> Response<BoxBody<Bytes, Infallible>> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("content-type", "application/json")
        .body(
            Full::new(Bytes::from(
                r#"{"status":"error","code":"INTERNAL_ERROR","message":"An internal error occurred"}"#,
            ))
            .boxed(),
        )
        .unwrap()
}
