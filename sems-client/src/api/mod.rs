mod client;
mod readings;
mod transactions;

pub use client::ApiClient;
pub use readings::fetch_readings;
pub use transactions::fetch_transaction;
