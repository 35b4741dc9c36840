use tracing::{debug, info};

use crate::browser::probe::DomProbe;
use crate::error::{recover, SweepResult};
use crate::signature::catalog::SignatureCatalog;
use crate::signature::signature_model::{DetectedSignature, DetectionResult, Signature};

/// Evaluate every catalog signature against the current page.
///
/// A matcher that finds nothing is a miss, not a fault. A matcher whose
/// query fails is logged and counted as a miss; only run-fatal driver
/// errors propagate.
pub fn detect(catalog: &SignatureCatalog, probe: &mut dyn DomProbe) -> SweepResult<DetectionResult> {
    let mut result = DetectionResult::default();

    for signature in catalog.signatures() {
        let hits = matcher_hits(signature, probe)?;
        if hits >= signature.min_matches {
            debug!(signature = %signature.name, hits, "signature detected");
            result.insert(DetectedSignature {
                name: signature.name.clone(),
                tester: signature.tester,
                hits,
            });
        }
    }

    info!(
        detected = result.len(),
        catalog = catalog.len(),
        "signature detection complete"
    );
    Ok(result)
}

/// Elements matched, summed across every matcher of the signature.
pub fn matcher_hits(signature: &Signature, probe: &mut dyn DomProbe) -> SweepResult<u32> {
    let mut hits: u32 = 0;
    for matcher in &signature.matchers {
        let context = format!("detect '{}' via {}", signature.name, matcher);
        if let Some(count) = recover(&context, probe.count(matcher))? {
            hits = hits.saturating_add(count);
        }
    }
    Ok(hits)
}
