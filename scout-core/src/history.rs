//! Per-symbol rolling price/volume history.
//!
//! One entry per symbol, each behind its own lock; the map itself sits
//! behind a read-write lock that is only taken for writing when a new
//! symbol appears. Both series always have the same length and never exceed
//! the store capacity (oldest samples are evicted first).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::domain::Candle;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Rolling window for one symbol, most recent last.
#[derive(Debug, Clone, Default)]
pub struct SymbolHistory {
    prices: VecDeque<f64>,
    volumes: VecDeque<f64>,
}

impl SymbolHistory {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.prices.iter().copied().collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.volumes.iter().copied().collect()
    }

    fn push(&mut self, price: f64, volume: f64, capacity: usize) {
        self.prices.push_back(price);
        self.volumes.push_back(volume);
        while self.prices.len() > capacity {
            self.prices.pop_front();
            self.volumes.pop_front();
        }
    }

    fn replace(&mut self, candles: &[Candle], capacity: usize) {
        self.prices.clear();
        self.volumes.clear();
        let start = candles.len().saturating_sub(capacity);
        for candle in &candles[start..] {
            self.prices.push_back(candle.close);
            self.volumes.push_back(candle.volume);
        }
    }
}

/// Snapshot of one symbol's window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    pub prices: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }
}

#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    symbols: RwLock<HashMap<String, Arc<Mutex<SymbolHistory>>>>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            symbols: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn entry(&self, symbol: &str) -> Arc<Mutex<SymbolHistory>> {
        if let Some(entry) = self
            .symbols
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
        {
            return Arc::clone(entry);
        }
        let mut map = self
            .symbols
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(symbol.to_string()).or_default())
    }

    /// Append one sample and return the window as it stands afterwards.
    pub fn append(&self, symbol: &str, price: f64, volume: f64) -> HistorySnapshot {
        let entry = self.entry(symbol);
        let mut history = entry.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(price, volume, self.capacity);
        HistorySnapshot {
            prices: history.prices(),
            volumes: history.volumes(),
        }
    }

    /// Replace the window with candle closes/volumes, then append one sample.
    pub fn backfill(
        &self,
        symbol: &str,
        candles: &[Candle],
        price: f64,
        volume: f64,
    ) -> HistorySnapshot {
        let entry = self.entry(symbol);
        let mut history = entry.lock().unwrap_or_else(PoisonError::into_inner);
        history.replace(candles, self.capacity);
        history.push(price, volume, self.capacity);
        HistorySnapshot {
            prices: history.prices(),
            volumes: history.volumes(),
        }
    }

    pub fn snapshot(&self, symbol: &str) -> Option<HistorySnapshot> {
        let map = self.symbols.read().unwrap_or_else(PoisonError::into_inner);
        let entry = map.get(symbol)?;
        let history = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Some(HistorySnapshot {
            prices: history.prices(),
            volumes: history.volumes(),
        })
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.snapshot(symbol).map_or(0, |s| s.len())
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear(&self, symbol: &str) {
        self.symbols
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(symbol);
    }
}
