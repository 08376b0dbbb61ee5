use std::sync::Arc;

use anyhow::Context;

use attest_ledger::{HttpLedger, LedgerReader};
use attest_pinning::HttpPinningClient;
use attest_resolver::{ClaimEngine, EngineConfig, NullSink};
use attest_types::{AtomMetadata, CandidateTriple, EntityId};

pub struct Endpoints {
    pub ledger_url: String,
    pub pinning_url: String,
}

fn engine(endpoints: &Endpoints) -> anyhow::Result<ClaimEngine> {
    let ledger = Arc::new(
        HttpLedger::new(&endpoints.ledger_url).context("building ledger client")?,
    );
    let pinner = Arc::new(
        HttpPinningClient::new(&endpoints.pinning_url).context("building pinning client")?,
    );
    Ok(ClaimEngine::new(
        ledger.clone(),
        ledger,
        pinner,
        Arc::new(NullSink),
        EngineConfig::default(),
    ))
}

fn reader(endpoints: &Endpoints) -> anyhow::Result<HttpLedger> {
    HttpLedger::new(&endpoints.ledger_url).context("building ledger client")
}

#[allow(clippy::too_many_arguments)]
pub async fn publish(
    endpoints: &Endpoints,
    subject_name: String,
    subject_url: String,
    predicate: String,
    object_name: String,
    object_url: String,
    object_description: Option<String>,
    origin: Option<String>,
) -> anyhow::Result<()> {
    let subject = AtomMetadata::new(subject_name, subject_url);
    let mut object = AtomMetadata::new(object_name, object_url);
    if let Some(description) = object_description {
        object = object.with_description(description);
    }
    let mut candidate = CandidateTriple::new(predicate, object);
    if let Some(origin) = origin {
        candidate = candidate.with_origin(origin);
    }

    let resolution = engine(endpoints)?
        .resolve_triple(&subject, &candidate)
        .await
        .context("claim resolution failed")?;

    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

pub async fn batch(
    endpoints: &Endpoints,
    file: &str,
    subject_name: String,
    subject_url: String,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading candidates from {file}"))?;
    let candidates: Vec<CandidateTriple> =
        serde_json::from_str(&raw).context("candidates file must be a JSON array")?;
    let subject = AtomMetadata::new(subject_name, subject_url);

    let outcome = engine(endpoints)?
        .resolve_batch(&subject, &candidates)
        .await
        .context("batch resolution failed")?;

    let mut failed = 0usize;
    for (index, result) in outcome.results.iter().enumerate() {
        match result {
            Ok(resolution) => {
                println!("[{index}] {}", serde_json::to_string(resolution)?);
            }
            Err(error) => {
                failed += 1;
                eprintln!("[{index}] failed: {error}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} candidates failed", outcome.len());
    }
    Ok(())
}

pub async fn costs(endpoints: &Endpoints) -> anyhow::Result<()> {
    let ledger = reader(endpoints)?;
    let atom = ledger.atom_cost().await.context("reading atom cost")?;
    let triple = ledger.triple_cost().await.context("reading triple cost")?;
    println!(
        "{}",
        serde_json::json!({ "atom_cost": atom, "triple_cost": triple })
    );
    Ok(())
}

pub async fn check(endpoints: &Endpoints, id: &str) -> anyhow::Result<()> {
    let id = EntityId::from_hex(id).context("parsing entity id")?;
    let created = reader(endpoints)?
        .is_entity_created(id)
        .await
        .context("querying existence")?;
    println!("{}", serde_json::json!({ "id": id.to_hex(), "created": created }));
    Ok(())
}
