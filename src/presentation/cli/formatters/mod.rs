pub mod result_fmt;
