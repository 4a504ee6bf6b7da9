use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::storage::{CodecOptions, Flower, Resolver};
use crate::types::LinkId;

use crate::admin::context::FlowerContext;
use crate::admin::error::{AdminError, Result};
use crate::admin::util::load_flower_file;

const MAX_FINDINGS: usize = 32;

/// Indicates the severity level of a verification finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifySeverity {
    /// Informational message about the verification process.
    Info,
    /// Non-critical issue that may indicate a problem.
    Warning,
    /// Critical issue indicating corruption or a broken invariant.
    Error,
}

/// Represents a single issue discovered during verification.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// The severity level of this finding.
    pub severity: VerifySeverity,
    /// Human-readable description of the issue.
    pub message: String,
}

impl VerifyFinding {
    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Warning,
            message: message.into(),
        }
    }
}

/// Statistics collected during verification.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerifyCounts {
    /// Chains examined.
    pub chains: u64,
    /// Links reachable from a chain head.
    pub links: u64,
    /// Live links not reachable from any chain.
    pub orphan_links: u64,
    /// Ends registered in the flower.
    pub ends: u64,
    /// Groups registered in the flower.
    pub groups: u64,
}

/// Complete report of a verification pass.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// Whether verification passed without any error finding.
    pub success: bool,
    /// Issues discovered during verification.
    pub findings: Vec<VerifyFinding>,
    /// Statistics about the structures examined.
    pub counts: VerifyCounts,
}

impl VerifyReport {
    pub(crate) fn from_findings(findings: Vec<VerifyFinding>, counts: VerifyCounts) -> Self {
        let success = !findings
            .iter()
            .any(|finding| finding.severity == VerifySeverity::Error);
        Self {
            success,
            findings,
            counts,
        }
    }
}

/// Verifies every chain of `flower`.
///
/// Checks chain invariants (adjacency, indices, back-references, cached
/// length), that every link's Ends and Group still resolve, and that no live
/// link is unreachable from a chain.
pub fn verify_flower(flower: &Flower) -> VerifyReport {
    let mut findings = Vec::new();
    let mut counts = VerifyCounts {
        ends: flower.catalog().end_count() as u64,
        groups: flower.catalog().group_count() as u64,
        ..VerifyCounts::default()
    };
    let mut reachable: HashSet<LinkId> = HashSet::new();

    for chain in flower.chains() {
        counts.chains += 1;
        if let Err(err) = chain.check(flower.links()) {
            push(&mut findings, VerifyFinding::error(err.to_string()));
        }
        for (id, link) in chain.iter(flower.links()) {
            reachable.insert(id);
            let catalog = flower.catalog();
            let resolved = catalog
                .resolve_end(link.three_end())
                .and_then(|_| catalog.resolve_end(link.five_end()))
                .and_then(|_| catalog.resolve_group(link.group()));
            if let Err(err) = resolved {
                push(
                    &mut findings,
                    VerifyFinding::error(format!(
                        "{} index {}: {err}",
                        chain.id(),
                        link.link_index()
                    )),
                );
            }
        }
    }
    counts.links = reachable.len() as u64;

    let orphans = flower
        .links()
        .iter()
        .filter(|(id, _)| !reachable.contains(id))
        .count();
    counts.orphan_links = orphans as u64;
    if orphans > 0 {
        push(
            &mut findings,
            VerifyFinding::warning(format!("{orphans} links are not reachable from any chain")),
        );
    }

    VerifyReport::from_findings(findings, counts)
}

/// Loads the flower file at `path` against `context` and verifies it.
///
/// A file that fails to load is reported as an error finding rather than an
/// `Err`; only a missing file or an unusable context is an error.
pub fn verify_file(path: &Path, context: &FlowerContext, opts: &CodecOptions) -> Result<VerifyReport> {
    let mut flower = context.empty_flower()?;
    if !path.exists() {
        return Err(AdminError::missing_file(path));
    }
    let report = match load_flower_file(path, &mut flower, opts) {
        Ok(_) => verify_flower(&flower),
        Err(err) => {
            let counts = VerifyCounts {
                ends: flower.catalog().end_count() as u64,
                groups: flower.catalog().group_count() as u64,
                ..VerifyCounts::default()
            };
            VerifyReport::from_findings(
                vec![VerifyFinding::error(format!("load failed: {err}"))],
                counts,
            )
        }
    };
    info!(
        path = %path.display(),
        success = report.success,
        findings = report.findings.len(),
        "verify.done"
    );
    Ok(report)
}

fn push(findings: &mut Vec<VerifyFinding>, finding: VerifyFinding) {
    if findings.len() < MAX_FINDINGS {
        findings.push(finding);
    }
}
