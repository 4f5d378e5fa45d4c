use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use apikit::api::LimitPolicy;

/// `modules.api_ingress` section of the application config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiIngressConfig {
    pub cors_enabled: bool,
    /// Page size when the client sends no (or a non-positive) `limit`.
    pub default_page_limit: usize,
    /// Larger `limit` values are clamped to this.
    pub max_page_limit: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            cors_enabled: false,
            default_page_limit: 10,
            max_page_limit: 100,
        }
    }
}

impl ApiIngressConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.default_page_limit > 0, "default_page_limit must be positive");
        ensure!(
            self.default_page_limit <= self.max_page_limit,
            "default_page_limit ({}) exceeds max_page_limit ({})",
            self.default_page_limit,
            self.max_page_limit
        );
        Ok(())
    }

    pub fn limit_policy(&self) -> LimitPolicy {
        LimitPolicy {
            default: self.default_page_limit,
            max: self.max_page_limit,
        }
    }
}
