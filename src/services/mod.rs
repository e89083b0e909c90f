pub mod api_key_service;
pub use api_key_service::{ApiKeyError, ApiKeyService, IssuedApiKey};

pub mod api_key_service_impl;
pub use api_key_service_impl::SeaOrmApiKeyService;
