//! Reserved health-name responder.

use super::handlers::HandlerMap;
use crate::environment::Environment;
use crate::tools::{HealthStatus, NameResolver, SystemHealthReport, ToolHealthTracker, ToolRegistry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct RegistryCheck {
    pub tools: usize,
    pub immediate: usize,
    pub deferred: usize,
    pub servers: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandlerCheck {
    pub registered: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolverCheck {
    pub aliases: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub registry: RegistryCheck,
    pub handlers: HandlerCheck,
    pub resolver: ResolverCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_health: Option<SystemHealthReport>,
}

/// Answer to the reserved health name.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: HealthChecks,
    pub issues: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the dispatcher was built.
    pub uptime: u64,
    pub version: String,
    pub environment: Environment,
}

impl HealthReport {
    pub(crate) fn collect(
        registry: &ToolRegistry,
        handlers: &HandlerMap,
        resolver: &NameResolver,
        tracker: Option<&ToolHealthTracker>,
        environment: &Environment,
        started_at: Instant,
    ) -> Self {
        let mut issues = Vec::new();

        let registered = handlers.registered_count();
        if registered == 0 {
            issues.push("No tool handlers registered".to_string());
        }

        let tool_health = tracker.map(ToolHealthTracker::check_system_health);
        let mut unhealthy = false;
        if let Some(report) = &tool_health {
            for tool in &report.tool_reports {
                if tool.status == HealthStatus::Unhealthy {
                    unhealthy = true;
                    issues.push(format!(
                        "Tool '{}' is unhealthy: {}",
                        tool.tool_name,
                        tool.issues.join("; ")
                    ));
                }
            }
        }

        let status = if unhealthy {
            HealthStatus::Unhealthy
        } else if !issues.is_empty() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            checks: HealthChecks {
                registry: RegistryCheck {
                    tools: registry.tool_count(),
                    immediate: registry.immediate_tools().len(),
                    deferred: registry.deferred_tools().len(),
                    servers: registry.servers().len(),
                },
                handlers: HandlerCheck {
                    registered,
                    missing: registry.tool_count().saturating_sub(registered),
                },
                resolver: ResolverCheck {
                    aliases: resolver.alias_count(),
                },
                tool_health,
            },
            issues,
            timestamp: Utc::now(),
            uptime: started_at.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: environment.clone(),
        }
    }
}
