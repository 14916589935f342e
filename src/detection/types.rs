// SPDX-License-Identifier: MPL-2.0

//! Core types for detection results

use crate::constants::detection::{CODE_PREFIX, TEXT_PREFIX};

/// Combined output of the text and barcode detectors for one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionResult {
    /// Recognized text, if the text detector produced any
    pub text: Option<String>,
    /// Raw barcode values in detector order
    pub codes: Vec<String>,
}

impl DetectionResult {
    /// Build a result from raw detector outputs
    ///
    /// Text is trimmed and dropped when blank; empty barcode values are skipped.
    pub fn new(text: Option<String>, codes: Vec<String>) -> Self {
        let text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let codes = codes.into_iter().filter(|c| !c.is_empty()).collect();
        Self { text, codes }
    }

    /// Whether neither detector found anything
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.codes.is_empty()
    }

    /// Display string: `TEXT: <t>\nCODE: <codes>` with empty parts omitted
    pub fn merged(&self) -> Option<String> {
        let mut parts = Vec::with_capacity(2);

        if let Some(text) = &self.text {
            parts.push(format!("{}{}", TEXT_PREFIX, text));
        }
        if !self.codes.is_empty() {
            parts.push(format!("{}{}", CODE_PREFIX, self.codes.join(" ")));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}
