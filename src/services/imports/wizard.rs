use serde::Serialize;
use thiserror::Error;

use super::parsers::{parse_import, ImportPlatform, ImportedItem};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectPlatform,
    UploadFile,
    ReviewConfirm,
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Expected step {expected:?} but the import is at {actual:?}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },

    #[error("The uploaded file contained no importable items")]
    NoItems,

    #[error("Select at least one item to import")]
    EmptySelection,

    #[error("Item {index} does not exist (only {available} parsed)")]
    IndexOutOfRange { index: usize, available: usize },

    #[error(transparent)]
    Parse(#[from] AppError),
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Parse(inner) => inner,
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

/// Linear import flow: pick a platform, upload its export, confirm a subset
///
/// Steps never go backwards; `confirm` consumes the wizard.
#[derive(Debug)]
pub struct ImportWizard {
    step: WizardStep,
    platform: Option<ImportPlatform>,
    items: Vec<ImportedItem>,
}

impl Default for ImportWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::SelectPlatform,
            platform: None,
            items: Vec::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn platform(&self) -> Option<ImportPlatform> {
        self.platform
    }

    /// Items parsed from the uploaded file, for review
    pub fn items(&self) -> &[ImportedItem] {
        &self.items
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        if self.step != expected {
            return Err(WizardError::WrongStep {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    pub fn select_platform(&mut self, platform: ImportPlatform) -> Result<(), WizardError> {
        self.expect_step(WizardStep::SelectPlatform)?;
        self.platform = Some(platform);
        self.step = WizardStep::UploadFile;
        Ok(())
    }

    /// Parses the export; the wizard only advances if it yields an item
    pub fn upload(&mut self, content: &str) -> Result<&[ImportedItem], WizardError> {
        self.expect_step(WizardStep::UploadFile)?;
        let Some(platform) = self.platform else {
            return Err(WizardError::WrongStep {
                expected: WizardStep::SelectPlatform,
                actual: self.step,
            });
        };

        let items = parse_import(platform, content)?;
        if items.is_empty() {
            return Err(WizardError::NoItems);
        }

        self.items = items;
        self.step = WizardStep::ReviewConfirm;
        Ok(&self.items)
    }

    /// Emits the items at `indices` in the order given, duplicates ignored
    pub fn confirm(self, indices: &[usize]) -> Result<Vec<ImportedItem>, WizardError> {
        self.expect_step(WizardStep::ReviewConfirm)?;
        if indices.is_empty() {
            return Err(WizardError::EmptySelection);
        }

        let available = self.items.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= available) {
            return Err(WizardError::IndexOutOfRange { index, available });
        }

        let mut seen = vec![false; available];
        let selected = indices
            .iter()
            .filter(|&&i| !std::mem::replace(&mut seen[i], true))
            .map(|&i| self.items[i].clone())
            .collect();

        Ok(selected)
    }
}
