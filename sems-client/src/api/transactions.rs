use crate::api::ApiClient;
use crate::domain::Transaction;
use crate::error::ClientError;

pub async fn fetch_transaction(
    client: &ApiClient,
    transaction_id: i64,
) -> Result<Transaction, ClientError> {
    client.get_data(&format!("/transactions/{transaction_id}")).await
}
