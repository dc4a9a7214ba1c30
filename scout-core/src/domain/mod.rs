//! Domain types shared by the scoring engine and the risk manager.

pub mod candle;
pub mod interval;
pub mod market;
pub mod position;
pub mod signal;
pub mod ticker;
pub mod trade;

pub use candle::{closes, validate_series, volumes, Candle};
pub use interval::{Interval, UnknownInterval};
pub use market::{BandPosition, Regime, Trend, VolumePhase};
pub use position::{Position, Side};
pub use signal::{Action, Signal, TimeframeAnalysis};
pub use ticker::Ticker;
pub use trade::TradeResult;
