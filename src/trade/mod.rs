mod config;
mod engine;
pub(crate) mod error;
pub(crate) mod process;
mod session;
mod state;


pub use config::TradingConfig;
pub use engine::{TradingController, TradingEngine};
pub use state::{
    TradingReader, TradingReceiver, TradingStatus, TradingStatusNotRunning, TradingUpdate,
};
