//! Validation result types.

use serde::{Deserialize, Serialize};

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DuplicateIp,
    MtuMismatch,
    MissingComponent,
    VlanInconsistency,
    GatewayConfig,
    NetworkLoop,
    ProtocolOptimization,
    NodeAggregation,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_devices: Vec<String>,
    pub recommendation: String,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        severity: Severity,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            affected_devices: Vec::new(),
            recommendation: recommendation.into(),
        }
    }

    pub fn with_devices(mut self, devices: Vec<String>) -> Self {
        self.affected_devices = devices;
        self
    }
}

/// Output of one check: its own issues and warnings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Findings {
    pub issues: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl Findings {
    pub fn issue(&mut self, finding: Finding) {
        self.issues.push(finding);
    }

    pub fn warning(&mut self, finding: Finding) {
        self.warnings.push(finding);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.warnings.is_empty()
    }
}

/// A check that failed and contributed nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCheck {
    pub name: String,
    pub reason: String,
}

/// Merged result of the whole check battery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub total_issues: usize,
    pub total_warnings: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_checks: Vec<SkippedCheck>,
}

impl ValidationReport {
    /// Append a check's findings, keeping the totals in step
    pub fn merge(&mut self, findings: Findings) {
        self.issues.extend(findings.issues);
        self.warnings.extend(findings.warnings);
        self.total_issues = self.issues.len();
        self.total_warnings = self.warnings.len();
    }

    /// Findings of one kind, issues first
    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.issues
            .iter()
            .chain(self.warnings.iter())
            .filter(move |finding| finding.kind == kind)
    }
}

/// Reasons a single check can fail
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("cycle search budget of {steps} steps exhausted before any loop was found")]
    SearchBudgetExhausted { steps: usize },
    #[error("device {0} is in the topology but not in the device store")]
    MissingDevice(String),
}
