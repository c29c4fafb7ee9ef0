// Library for tests to access modules

pub mod bandwidth_worker;
pub mod capture_worker;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod report;
pub mod rotation_worker;
pub mod source;
pub mod state;
pub mod version;
