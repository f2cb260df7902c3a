pub mod accounts;
pub mod aggregation;
pub mod catalog;
pub mod chat;
pub mod generator;

pub use accounts::{AccountService, Argon2Verifier, CredentialVerifier};
pub use aggregation::Aggregator;
pub use catalog::{CatalogClient, TmdbClient};
pub use chat::ChatService;
pub use generator::{ContentGenerator, DisabledGenerator, GeminiClient};
