//! Signal analysis: timeframe analyzer, multi-timeframe aggregator, regime
//! classifier, entry checklist and the scorer that ties them together.

pub mod criteria;
pub mod mtf;
pub mod regime;
pub mod scorer;
pub mod timeframe;

pub use criteria::{evaluate, ScoreCard, ScoringInputs, MAX_POINTS};
pub use mtf::{analyze_multi_timeframe, combine, MtfReading, TIMEFRAMES};
pub use regime::{acceptance_threshold, RegimeClassifier};
pub use scorer::SignalScorer;
pub use timeframe::analyze_timeframe;
