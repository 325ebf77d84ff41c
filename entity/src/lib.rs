pub mod bookmarks;
pub mod chat_messages;
pub mod payment_intents;
pub mod posts;
pub mod purchased_content;
pub mod subscription_bundles;
pub mod subscriptions;
pub mod transactions;
pub mod users;
pub mod withdrawal_requests;
