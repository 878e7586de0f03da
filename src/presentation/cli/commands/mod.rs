pub mod config;
pub mod daemon;
pub mod list;
pub mod menu;
pub mod run;
