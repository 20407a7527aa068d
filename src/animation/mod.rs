pub mod ease;
pub mod mapper;
pub mod units;
