use crate::api::{ApiServer, AppState};
use crate::auth::HttpIdentityResolver;
use crate::backend::{BackendApi, HttpBackendClient};
use crate::billing::{CheckoutClient, WebhookHandler};
use crate::config::{Config, Credentials};
use crate::db::Database;
use crate::entitlement::EntitlementGate;
use crate::subscription::{SqliteSubscriptionStore, SubscriptionQuery, SubscriptionStore};
use crate::upload::UploadFlow;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Everything wired from config and credentials, shared by the server and CLI.
pub struct Services {
    pub config: Config,
    pub db: Database,
    pub query: SubscriptionQuery,
    pub gate: EntitlementGate,
    pub uploads: UploadFlow,
    pub backend: Arc<dyn BackendApi>,
    pub store: Arc<dyn SubscriptionStore>,
    pub webhooks: WebhookHandler,
    pub checkout: Arc<CheckoutClient>,
}

impl Services {
    /// Missing credentials are fatal here; nothing starts half-configured.
    pub fn build() -> Result<Self> {
        let credentials = Credentials::from_env()?;
        let config = Config::load()?;
        let db = Database::open_default()?;
        Self::from_parts(config, credentials, db)
    }

    pub fn from_parts(config: Config, credentials: Credentials, db: Database) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("meetnotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let identity = Arc::new(HttpIdentityResolver::new(
            http.clone(),
            &credentials.auth_url,
            &credentials.auth_anon_key,
        ));
        let backend: Arc<dyn BackendApi> =
            Arc::new(HttpBackendClient::new(http.clone(), &credentials.api_base_url));
        let store: Arc<dyn SubscriptionStore> = Arc::new(SqliteSubscriptionStore::new(db.clone()));

        let query = SubscriptionQuery::new(identity, store.clone());
        let gate = EntitlementGate::new(
            query.clone(),
            backend.clone(),
            config.entitlement.free_summaries as usize,
            config.entitlement.on_lookup_failure,
        );
        let uploads = UploadFlow::new(backend.clone(), gate.clone(), db.clone());
        let webhooks = WebhookHandler::new(
            store.clone(),
            &credentials.stripe_webhook_secret,
            config.billing.signature_tolerance_secs,
            config.billing.placeholder_period_days,
        );
        let checkout = Arc::new(CheckoutClient::new(
            http,
            &config.billing.api_base,
            &credentials.stripe_secret_key,
            config.billing.price_id.clone(),
            &config.billing.app_url,
        ));

        Ok(Self {
            config,
            db,
            query,
            gate,
            uploads,
            backend,
            store,
            webhooks,
            checkout,
        })
    }

    pub fn into_state(self) -> AppState {
        AppState {
            webhooks: self.webhooks,
            checkout: self.checkout,
            query: self.query,
            gate: self.gate,
            uploads: self.uploads,
            backend: self.backend,
            db: self.db,
        }
    }
}

pub async fn run_service() -> Result<()> {
    info!("Starting meetnotes service");

    let services = Services::build()?;
    let bind = services.config.server.bind.clone();
    let max_upload_mb = services.config.server.max_upload_mb;

    if services.config.billing.price_id.is_none() {
        info!("STRIPE_PRICE_ID not set; checkout sessions will be refused");
    }
    info!(
        "Free summaries per user: {}, lookup-failure policy: {}",
        services.config.entitlement.free_summaries,
        services.config.entitlement.on_lookup_failure.as_str()
    );

    let api_server = ApiServer::new(&bind, max_upload_mb, services.into_state());
    api_server.start().await
}
