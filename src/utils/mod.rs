pub mod formatters;
pub mod sparkline;
