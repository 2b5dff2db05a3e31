// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! User-facing messages produced while editing

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLevel {
    Info,
    Warning,
}

/// A non-fatal message for the host to show in its status area
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub level: ReportLevel,
    pub message: String,
}

impl Report {
    pub fn info(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::info!("{}", message);
        Self {
            level: ReportLevel::Info,
            message,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!("{}", message);
        Self {
            level: ReportLevel::Warning,
            message,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level == ReportLevel::Warning
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            ReportLevel::Info => write!(f, "{}", self.message),
            ReportLevel::Warning => write!(f, "warning: {}", self.message),
        }
    }
}
