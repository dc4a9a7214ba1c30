pub mod binance;
pub mod circuit_breaker;

pub use binance::BinanceClient;
pub use circuit_breaker::CircuitBreaker;
