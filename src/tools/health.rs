//! Tool health tracking and circuit breaking.
//!
//! In-memory sliding-window health metrics per tool, plus an optional
//! closed/open/half-open circuit breaker per tool. Both are off by default;
//! the dispatcher only consults them when enabled in [`HealthConfig`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

// =============================================================================
// Configuration
// =============================================================================

/// Health assessment thresholds (configurable, not hardcoded).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HealthConfig {
    /// Record execution metrics for every dispatched call (default: false).
    pub tracking_enabled: bool,
    /// Minimum success rate for HEALTHY status (default: 0.95).
    pub success_rate_healthy: f64,
    /// Minimum success rate for DEGRADED status (default: 0.80).
    pub success_rate_degraded: f64,
    /// Maximum avg latency (ms) for HEALTHY status (default: 2000).
    pub latency_healthy_ms: u64,
    /// Maximum avg latency (ms) for DEGRADED status (default: 5000).
    pub latency_degraded_ms: u64,
    /// Minimum calls before health assessment (default: 5).
    pub min_calls_for_assessment: usize,
    /// Sliding window size for health metrics (default: 100).
    pub window_size: usize,
    /// Reject calls to tools whose breaker is open (default: false).
    pub circuit_breaker_enabled: bool,
    /// Consecutive failures that open the breaker (default: 5).
    pub failure_threshold: u32,
    /// Time an open breaker waits before admitting a probe (default: 30s).
    #[serde(with = "humantime_serde")]
    #[schemars(with = "String")]
    pub cooldown: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            tracking_enabled: false,
            success_rate_healthy: 0.95,
            success_rate_degraded: 0.80,
            latency_healthy_ms: 2000,
            latency_degraded_ms: 5000,
            min_calls_for_assessment: 5,
            window_size: 100,
            circuit_breaker_enabled: false,
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

impl HealthConfig {
    /// Whether the dispatcher needs a tracker at all.
    pub fn is_active(&self) -> bool {
        self.tracking_enabled || self.circuit_breaker_enabled
    }
}

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    fn severity(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 2,
            HealthStatus::Unknown => 3,
        }
    }
}

// =============================================================================
// Circuit breaker
// =============================================================================

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
enum Breaker {
    Closed { consecutive_failures: u32 },
    Open { since: Instant },
    HalfOpen { probe_in_flight: bool },
}

/// Per-tool circuit breaker.
///
/// Closed counts consecutive failures and opens at the threshold. Open
/// rejects every call until the cooldown elapses, then admits exactly one
/// probe (half-open). A successful probe closes the breaker, a failed one
/// re-opens it.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: Breaker,
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: Breaker::Closed {
                consecutive_failures: 0,
            },
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    pub fn state(&self) -> CircuitState {
        match self.state {
            Breaker::Closed { .. } => CircuitState::Closed,
            Breaker::Open { .. } => CircuitState::Open,
            Breaker::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Decide whether a call may proceed at `now`.
    pub fn allow_call_at(&mut self, now: Instant) -> bool {
        match self.state {
            Breaker::Closed { .. } => true,
            Breaker::Open { since } => {
                if now.saturating_duration_since(since) >= self.cooldown {
                    self.state = Breaker::HalfOpen {
                        probe_in_flight: true,
                    };
                    true
                } else {
                    false
                }
            }
            Breaker::HalfOpen { probe_in_flight } => {
                if probe_in_flight {
                    false
                } else {
                    self.state = Breaker::HalfOpen {
                        probe_in_flight: true,
                    };
                    true
                }
            }
        }
    }

    pub fn record_success(&mut self) {
        self.state = Breaker::Closed {
            consecutive_failures: 0,
        };
    }

    pub fn record_failure_at(&mut self, now: Instant) {
        self.state = match self.state {
            Breaker::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures + 1;
                if failures >= self.failure_threshold {
                    Breaker::Open { since: now }
                } else {
                    Breaker::Closed {
                        consecutive_failures: failures,
                    }
                }
            }
            Breaker::HalfOpen { .. } => Breaker::Open { since: now },
            open @ Breaker::Open { .. } => open,
        };
    }
}

// =============================================================================
// Per-tool metrics
// =============================================================================

/// Single tool execution record (in-memory, sliding window).
#[derive(Debug, Clone)]
struct ExecutionRecord {
    success: bool,
    latency_ms: u64,
    error_type: Option<String>,
}

/// Sliding window metrics for a single tool.
#[derive(Debug)]
struct ToolMetrics {
    records: VecDeque<ExecutionRecord>,
    window_size: usize,
}

impl ToolMetrics {
    fn new(window_size: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
        }
    }

    fn record(&mut self, success: bool, latency_ms: u64, error_type: Option<String>) {
        if self.records.len() >= self.window_size {
            self.records.pop_front();
        }
        self.records.push_back(ExecutionRecord {
            success,
            latency_ms,
            error_type,
        });
    }

    fn total_calls(&self) -> usize {
        self.records.len()
    }

    fn error_count(&self) -> usize {
        self.records.iter().filter(|r| !r.success).count()
    }

    fn success_rate(&self) -> f64 {
        let total = self.total_calls();
        if total == 0 {
            return 0.0;
        }
        (total - self.error_count()) as f64 / total as f64
    }

    fn avg_latency_ms(&self) -> f64 {
        let total = self.total_calls();
        if total == 0 {
            return 0.0;
        }
        let sum: u64 = self.records.iter().map(|r| r.latency_ms).sum();
        sum as f64 / total as f64
    }

    fn error_patterns(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in self.records.iter().filter(|r| !r.success) {
            let error_type = record.error_type.as_deref().unwrap_or("unknown");
            *counts.entry(error_type.to_string()).or_default() += 1;
        }
        let mut patterns: Vec<(String, usize)> = counts.into_iter().collect();
        patterns.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        patterns
    }
}

// =============================================================================
// Health report
// =============================================================================

/// Health report for a single tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolHealthReport {
    pub tool_name: String,
    pub status: HealthStatus,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub total_calls: usize,
    pub recent_errors: usize,
    pub issues: Vec<String>,
    pub circuit_state: CircuitState,
}

/// System-wide health report.
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealthReport {
    pub status: HealthStatus,
    pub tool_reports: Vec<ToolHealthReport>,
    pub summary: HealthSummary,
}

/// Counts by health status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    pub unknown: usize,
}

// =============================================================================
// Health tracker
// =============================================================================

/// In-memory tool health tracker with sliding-window metrics.
#[derive(Debug)]
pub struct ToolHealthTracker {
    config: HealthConfig,
    metrics: HashMap<String, ToolMetrics>,
    breakers: HashMap<String, CircuitBreaker>,
    /// Tools that were registered but may not have executed yet.
    registered_tools: Vec<String>,
}

impl ToolHealthTracker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            metrics: HashMap::new(),
            breakers: HashMap::new(),
            registered_tools: Vec::new(),
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Register tool names for report display.
    pub fn set_registered_tools(&mut self, tool_names: Vec<String>) {
        self.registered_tools = tool_names;
    }

    /// Record a tool execution.
    pub fn record_execution(
        &mut self,
        tool_name: &str,
        success: bool,
        latency_ms: u64,
        error_type: Option<String>,
    ) {
        self.record_execution_at(tool_name, success, latency_ms, error_type, Instant::now());
    }

    pub fn record_execution_at(
        &mut self,
        tool_name: &str,
        success: bool,
        latency_ms: u64,
        error_type: Option<String>,
        now: Instant,
    ) {
        let window_size = self.config.window_size;
        self.metrics
            .entry(tool_name.to_string())
            .or_insert_with(|| ToolMetrics::new(window_size))
            .record(success, latency_ms, error_type);

        if self.config.circuit_breaker_enabled {
            let breaker = self.breaker_mut(tool_name);
            if success {
                breaker.record_success();
            } else {
                breaker.record_failure_at(now);
            }
        }
    }

    /// Whether a call to `tool_name` may proceed. Always true with the
    /// breaker disabled.
    pub fn allow_call(&mut self, tool_name: &str) -> bool {
        self.allow_call_at(tool_name, Instant::now())
    }

    pub fn allow_call_at(&mut self, tool_name: &str, now: Instant) -> bool {
        if !self.config.circuit_breaker_enabled {
            return true;
        }
        self.breaker_mut(tool_name).allow_call_at(now)
    }

    pub fn circuit_state(&self, tool_name: &str) -> CircuitState {
        self.breakers
            .get(tool_name)
            .map(CircuitBreaker::state)
            .unwrap_or(CircuitState::Closed)
    }

    fn breaker_mut(&mut self, tool_name: &str) -> &mut CircuitBreaker {
        let (threshold, cooldown) = (self.config.failure_threshold, self.config.cooldown);
        self.breakers
            .entry(tool_name.to_string())
            .or_insert_with(|| CircuitBreaker::new(threshold, cooldown))
    }

    /// Check health of a single tool.
    pub fn check_tool_health(&self, tool_name: &str) -> ToolHealthReport {
        let circuit_state = self.circuit_state(tool_name);
        let Some(m) = self.metrics.get(tool_name) else {
            return ToolHealthReport {
                tool_name: tool_name.to_string(),
                status: HealthStatus::Unknown,
                success_rate: 0.0,
                avg_latency_ms: 0.0,
                total_calls: 0,
                recent_errors: 0,
                issues: vec!["No execution history".to_string()],
                circuit_state,
            };
        };

        let total = m.total_calls();
        let success_rate = m.success_rate();
        let avg_latency = m.avg_latency_ms();
        let recent_errors = m.error_count();

        if total < self.config.min_calls_for_assessment {
            return ToolHealthReport {
                tool_name: tool_name.to_string(),
                status: HealthStatus::Unknown,
                success_rate,
                avg_latency_ms: avg_latency,
                total_calls: total,
                recent_errors,
                issues: vec![format!(
                    "Insufficient data ({}/{})",
                    total, self.config.min_calls_for_assessment
                )],
                circuit_state,
            };
        }

        // Worst-of-two: success rate status vs latency status
        let rate_status = if success_rate >= self.config.success_rate_healthy {
            HealthStatus::Healthy
        } else if success_rate >= self.config.success_rate_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };

        let latency_status = if avg_latency <= self.config.latency_healthy_ms as f64 {
            HealthStatus::Healthy
        } else if avg_latency <= self.config.latency_degraded_ms as f64 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };

        let mut status = worse_status(rate_status, latency_status);
        if circuit_state == CircuitState::Open {
            status = HealthStatus::Unhealthy;
        }

        let mut issues = Vec::new();
        if success_rate < self.config.success_rate_healthy {
            issues.push(format!(
                "Success rate {:.1}% below {:.0}% threshold",
                success_rate * 100.0,
                self.config.success_rate_healthy * 100.0,
            ));
        }
        if avg_latency > self.config.latency_healthy_ms as f64 {
            issues.push(format!(
                "Avg latency {:.0}ms exceeds {}ms threshold",
                avg_latency, self.config.latency_healthy_ms,
            ));
        }
        if circuit_state == CircuitState::Open {
            issues.push(format!(
                "Circuit breaker open: {} consecutive failures, cooldown {}s",
                self.config.failure_threshold,
                self.config.cooldown.as_secs(),
            ));
        }

        ToolHealthReport {
            tool_name: tool_name.to_string(),
            status,
            success_rate,
            avg_latency_ms: avg_latency,
            total_calls: total,
            recent_errors,
            issues,
            circuit_state,
        }
    }

    /// Check health of all tools (registered + executed).
    pub fn check_system_health(&self) -> SystemHealthReport {
        let mut all_tools: Vec<String> = self.registered_tools.clone();
        for name in self.metrics.keys() {
            if !all_tools.contains(name) {
                all_tools.push(name.clone());
            }
        }
        all_tools.sort();

        let tool_reports: Vec<ToolHealthReport> = all_tools
            .iter()
            .map(|name| self.check_tool_health(name))
            .collect();

        let mut summary = HealthSummary::default();
        for report in &tool_reports {
            match report.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Degraded => summary.degraded += 1,
                HealthStatus::Unhealthy => summary.unhealthy += 1,
                HealthStatus::Unknown => summary.unknown += 1,
            }
        }

        // System status = worst of all assessed tool statuses
        let status = if summary.unhealthy > 0 {
            HealthStatus::Unhealthy
        } else if summary.degraded > 0 {
            HealthStatus::Degraded
        } else if summary.healthy > 0 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unknown
        };

        SystemHealthReport {
            status,
            tool_reports,
            summary,
        }
    }

    /// Get error patterns for a tool, most frequent first.
    pub fn get_error_patterns(&self, tool_name: &str) -> Vec<(String, usize)> {
        self.metrics
            .get(tool_name)
            .map(ToolMetrics::error_patterns)
            .unwrap_or_default()
    }

    /// Number of tracked tools.
    pub fn tool_count(&self) -> usize {
        self.metrics.len()
    }
}

impl Default for ToolHealthTracker {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

fn worse_status(a: HealthStatus, b: HealthStatus) -> HealthStatus {
    if a.severity() >= b.severity() {
        a
    } else {
        b
    }
}

// =============================================================================
// Tests
// =============================================================================
