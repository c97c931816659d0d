pub mod schedule;
pub mod unit;
