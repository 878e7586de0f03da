pub mod entities;
pub mod evaluator;
pub mod extractors;
pub mod ports;
pub mod value_objects;
