pub mod process_collector;
