pub mod alerter;
pub mod dispatcher;
pub mod runner;
