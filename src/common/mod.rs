pub mod config;
pub mod keygen;
pub mod pem;
pub mod types;
