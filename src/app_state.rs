use crate::{
    config::Config,
    services::{
        BundlesService, ChatService, EntitlementsService, JwtService, PaymentGateway,
        PaymentsService, StorageService, WithdrawalsService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: Arc<redis::Client>,
    pub gateway: Arc<PaymentGateway>,
    pub payments: Arc<PaymentsService>,
    pub entitlements: Arc<EntitlementsService>,
    pub withdrawals: Arc<WithdrawalsService>,
    pub bundles: Arc<BundlesService>,
    pub storage: Arc<StorageService>,
    pub jwt_service: Arc<JwtService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        // Connect to database
        let db = sea_orm::Database::connect(&config.database.url).await?;

        // Connect to Redis
        let redis = Arc::new(redis::Client::open(config.redis.url.as_str())?);

        // Initialize services
        let gateway = Arc::new(PaymentGateway::new(&config.gateway));
        let entitlements = Arc::new(EntitlementsService::new(db.clone()));
        let chat = Arc::new(ChatService::new(db.clone()));
        let payments = Arc::new(PaymentsService::new(
            db.clone(),
            gateway.clone(),
            entitlements.clone(),
            chat,
            config.application.base_url.clone(),
        ));
        let withdrawals = Arc::new(WithdrawalsService::new(db.clone(), gateway.clone()));
        let bundles = Arc::new(BundlesService::new(db.clone()));
        let storage = Arc::new(StorageService::new(&config.storage));
        let jwt_service = Arc::new(JwtService::new(Arc::new(config.auth.clone())));

        Ok(Self {
            db,
            redis,
            gateway,
            payments,
            entitlements,
            withdrawals,
            bundles,
            storage,
            jwt_service,
            config: Arc::new(config),
        })
    }
}
