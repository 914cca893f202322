mod api_response;
mod meter_reading;
mod transaction;

pub use api_response::ApiResponse;
pub use meter_reading::{parse_time_value, MeterReading};
pub use transaction::{Address, Transaction};
