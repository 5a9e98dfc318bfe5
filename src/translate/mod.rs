pub mod client;
pub mod factory;
pub mod gateway;
pub mod interface;

pub use factory::BackendFactory;
pub use gateway::Gateway;
pub use interface::{TranslationRequest, TranslationResult};
