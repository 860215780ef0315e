//! Integration tests for the hotroute reconfigurable facade

mod config_watch;
mod reload_scenario;
mod test_utils;
