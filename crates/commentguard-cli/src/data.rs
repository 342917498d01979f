//! Labelled training data in JSON Lines form
//!
//! One object per line: `{"text": "...", "label": 0}` with label `0`
//! (acceptable) or `1` (toxic). Blank lines are skipped.

use anyhow::{bail, Context};
use commentguard_core::Label;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Record {
    text: String,
    label: u8,
}

/// Parallel text and label columns
#[derive(Debug, Default)]
pub struct TrainingData {
    pub texts: Vec<String>,
    pub labels: Vec<Label>,
}

impl TrainingData {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut data = Self::default();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(line)
                .with_context(|| format!("line {}: invalid training record", index + 1))?;
            let Some(label) = Label::from_u8(record.label) else {
                bail!("line {}: label must be 0 or 1, got {}", index + 1, record.label);
            };
            data.texts.push(record.text);
            data.labels.push(label);
        }
        Ok(data)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read training data {}", path.display()))?;
        Self::parse(&content)
    }
}
