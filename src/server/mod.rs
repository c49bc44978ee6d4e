pub mod api;

use crate::agent::CompletionServiceFactory;
use crate::cli::Args;
use self::api::AppState;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use log::{ error, info };

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

impl Server {
    pub fn new(
        addr: String,
        factory: Arc<dyn CompletionServiceFactory>,
        args: Args,
    ) -> Self {
        let state = AppState {
            factory,
            empty_message_reply: Arc::from(args.empty_message_reply.as_str()),
        };
        Self { addr, state, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = api::router(self.state.clone());

        match self.tls_paths()? {
            Some((cert_path, key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    cert_path,
                    key_path
                ).await?;
                info!("HTTPS server listening on: https://{}", addr);
                axum_server::bind_rustls(addr, tls_config)
                    .serve(app.into_make_service())
                    .await?;
            }
            None => {
                let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                    error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                    e
                })?;
                info!("HTTP server listening on: http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }

    fn tls_paths(&self) -> Result<Option<(&str, &str)>, Box<dyn Error + Send + Sync>> {
        if !self.args.enable_tls {
            return Ok(None);
        }
        match (&self.args.tls_cert_path, &self.args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => Ok(Some((cert_path.as_str(), key_path.as_str()))),
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                Err("Missing TLS certificate or key path".into())
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                Err("TLS enabled without cert/key".into())
            }
        }
    }
}
