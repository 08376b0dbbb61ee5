//! HTTP RPC client for a remote ledger endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use attest_types::{Amount, AtomId, ContentUri, EntityId, TripleId, TxHash};

use crate::error::{LedgerError, RevertReason};
use crate::receipt::WriteReceipt;
use crate::traits::{LedgerReader, LedgerWriter};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ledger client speaking the attest JSON RPC surface.
///
/// Transport failures surface as [`LedgerError::Transient`]; structured
/// revert payloads surface as [`LedgerError::Reverted`] with the reason the
/// ledger reported; a timed-out write surfaces as
/// [`LedgerError::ConfirmationTimeout`].
pub struct HttpLedger {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    created: bool,
}

#[derive(Debug, Deserialize)]
struct CostsResponse {
    atom_cost: Amount,
    triple_cost: Amount,
}

#[derive(Debug, Deserialize)]
struct TripleResponse {
    subject: String,
    predicate: String,
    object: String,
}

#[derive(Debug, Serialize)]
struct CreateAtomsRequest<'a> {
    uris: &'a [ContentUri],
    costs: &'a [Amount],
}

#[derive(Debug, Serialize)]
struct CreateTriplesRequest {
    subjects: Vec<String>,
    predicates: Vec<String>,
    objects: Vec<String>,
    costs: Vec<Amount>,
}

#[derive(Debug, Deserialize)]
struct ReceiptResponse {
    ids: Vec<String>,
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct RevertPayload {
    reason: RevertReason,
}

impl HttpLedger {
    pub fn new(endpoint: &str) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| LedgerError::transient(format!("http client build: {error}")))?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| LedgerError::transient(error.to_string()))?;
        Self::decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, LedgerError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "submitting ledger write");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    LedgerError::ConfirmationTimeout
                } else {
                    LedgerError::transient(error.to_string())
                }
            })?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, LedgerError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|error| LedgerError::Decode(error.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

/// Map a non-success RPC response onto the ledger error taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> LedgerError {
    if status.is_server_error() {
        return LedgerError::transient(format!("ledger rpc {status}: {body}"));
    }
    if let Ok(payload) = serde_json::from_str::<RevertPayload>(body) {
        return LedgerError::reverted(payload.reason);
    }
    LedgerError::reverted(RevertReason::Other(format!("{status}: {body}")))
}

fn parse_id<T, F>(raw: &str, build: F) -> Result<T, LedgerError>
where
    F: FnOnce([u8; 32]) -> T,
{
    EntityId::from_hex(raw)
        .map(|id| build(*id.as_bytes()))
        .map_err(|error| LedgerError::Decode(error.to_string()))
}

#[async_trait]
impl LedgerReader for HttpLedger {
    async fn is_entity_created(&self, id: EntityId) -> Result<bool, LedgerError> {
        let response: CreatedResponse = self
            .get(&format!("/v1/entities/{}/created", id.to_hex()))
            .await?;
        Ok(response.created)
    }

    async fn atom_cost(&self) -> Result<Amount, LedgerError> {
        let costs: CostsResponse = self.get("/v1/costs").await?;
        Ok(costs.atom_cost)
    }

    async fn triple_cost(&self) -> Result<Amount, LedgerError> {
        let costs: CostsResponse = self.get("/v1/costs").await?;
        Ok(costs.triple_cost)
    }

    async fn triple(&self, id: TripleId) -> Result<(AtomId, AtomId, AtomId), LedgerError> {
        let response: TripleResponse = self.get(&format!("/v1/triples/{}", id.to_hex())).await?;
        Ok((
            parse_id(&response.subject, AtomId::from_bytes)?,
            parse_id(&response.predicate, AtomId::from_bytes)?,
            parse_id(&response.object, AtomId::from_bytes)?,
        ))
    }
}

#[async_trait]
impl LedgerWriter for HttpLedger {
    async fn create_atoms(
        &self,
        uris: &[ContentUri],
        costs: &[Amount],
    ) -> Result<WriteReceipt<AtomId>, LedgerError> {
        let response: ReceiptResponse = self
            .post("/v1/atoms", &CreateAtomsRequest { uris, costs })
            .await?;
        let ids = response
            .ids
            .iter()
            .map(|raw| parse_id(raw, AtomId::from_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let tx_hash = parse_id(&response.tx_hash, TxHash::from_bytes)?;
        Ok(WriteReceipt::new(ids, tx_hash))
    }

    async fn create_triples(
        &self,
        subjects: &[AtomId],
        predicates: &[AtomId],
        objects: &[AtomId],
        costs: &[Amount],
    ) -> Result<WriteReceipt<TripleId>, LedgerError> {
        let request = CreateTriplesRequest {
            subjects: subjects.iter().map(AtomId::to_hex).collect(),
            predicates: predicates.iter().map(AtomId::to_hex).collect(),
            objects: objects.iter().map(AtomId::to_hex).collect(),
            costs: costs.to_vec(),
        };
        let response: ReceiptResponse = self.post("/v1/triples", &request).await?;
        let ids = response
            .ids
            .iter()
            .map(|raw| parse_id(raw, TripleId::from_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let tx_hash = parse_id(&response.tx_hash, TxHash::from_bytes)?;
        Ok(WriteReceipt::new(ids, tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_reverts_are_classified_by_reason() {
        let error = classify_failure(StatusCode::CONFLICT, r#"{"reason":"triple_exists"}"#);
        assert_eq!(
            error.revert_reason(),
            Some(&RevertReason::TripleExists)
        );

        let error = classify_failure(
            StatusCode::PAYMENT_REQUIRED,
            r#"{"reason":"insufficient_funds"}"#,
        );
        assert_eq!(
            error.revert_reason(),
            Some(&RevertReason::InsufficientFunds)
        );
    }

    #[test]
    fn server_errors_are_transient() {
        let error = classify_failure(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(error.is_transient());
    }

    #[test]
    fn unstructured_client_errors_become_other_reverts() {
        let error = classify_failure(StatusCode::BAD_REQUEST, "bad payload");
        assert!(matches!(
            error.revert_reason(),
            Some(RevertReason::Other(_))
        ));
    }
}
