pub mod quotation;
pub mod session;
