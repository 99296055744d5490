//! Historical portfolio backtesting: time-stepped simulation with periodic
//! or threshold-triggered rebalancing, plus stress scenarios.

pub mod backtest_constants;
pub mod backtest_model;
pub mod backtest_service;
pub mod backtest_traits;
pub mod portfolio_simulator;

pub use backtest_model::*;
pub use backtest_service::*;
pub use backtest_traits::*;
pub use portfolio_simulator::*;

#[cfg(test)]
mod portfolio_simulator_tests;
