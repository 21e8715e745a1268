pub mod conversion;
pub mod crypto_sync;
pub mod quotation_sync;
pub mod session;
