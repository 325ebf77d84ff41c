// Service modules
pub mod bundles_service;
pub mod chat_service;
pub mod entitlements_service;
pub mod gateway_service;
pub mod jwt_service;
pub mod payments_service;
pub mod storage_service;
pub mod withdrawals_service;

pub use bundles_service::BundlesService;
pub use chat_service::ChatService;
pub use entitlements_service::EntitlementsService;
pub use gateway_service::PaymentGateway;
pub use jwt_service::JwtService;
pub use payments_service::PaymentsService;
pub use storage_service::StorageService;
pub use withdrawals_service::WithdrawalsService;
