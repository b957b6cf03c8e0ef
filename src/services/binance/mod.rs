//! Binance USD-M futures public REST data.

pub mod messages;
pub mod rest;

pub use rest::BinanceFuturesClient;
