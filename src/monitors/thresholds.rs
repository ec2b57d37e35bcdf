use crate::SystemMetrics;
use crate::config::Thresholds;
use crate::storage::schema::Severity;

pub const HIGH_CPU_TITLE: &str = "High CPU Load";
pub const CRITICAL_MEMORY_TITLE: &str = "Critical Memory Usage";

/// A threshold breach found in a metrics sample
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub title: &'static str,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEvaluation {
    Ok,
    Exceeding,
}

impl ResourceEvaluation {
    /// Exceeding only when strictly above the limit
    pub fn evaluate(resource: f32, limit: f32) -> ResourceEvaluation {
        if resource > limit {
            ResourceEvaluation::Exceeding
        } else {
            ResourceEvaluation::Ok
        }
    }
}

/// Check a sample against the fixed CPU and memory limits
///
/// Every call evaluates from scratch; repeated breaches are collapsed later by
/// the notification suppression window, not here.
pub fn evaluate(metrics: &SystemMetrics, thresholds: &Thresholds) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if ResourceEvaluation::evaluate(metrics.cpu, thresholds.cpu_percent)
        == ResourceEvaluation::Exceeding
    {
        anomalies.push(Anomaly {
            title: HIGH_CPU_TITLE,
            message: format!("CPU is at {:.1}%", metrics.cpu),
            severity: Severity::Danger,
        });
    }

    if ResourceEvaluation::evaluate(metrics.memory.percent, thresholds.memory_percent)
        == ResourceEvaluation::Exceeding
    {
        anomalies.push(Anomaly {
            title: CRITICAL_MEMORY_TITLE,
            message: format!("Memory is at {:.1}%", metrics.memory.percent),
            severity: Severity::Warning,
        });
    }

    anomalies
}
