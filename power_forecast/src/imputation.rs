//! Mean imputation of missing sensor values

use crate::data::{SensorDataset, SensorField};
use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// What was filled in for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldImputation {
    pub field: SensorField,
    /// Mean of the observed values, used as the fill value
    pub mean: f64,
    /// Number of missing values replaced
    pub replaced: usize,
}

/// Outcome of [`impute_means`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputationReport {
    pub fields: Vec<FieldImputation>,
}

impl ImputationReport {
    /// Total number of values replaced across all fields
    pub fn total_replaced(&self) -> usize {
        self.fields.iter().map(|f| f.replaced).sum()
    }

    /// Entry for a single field
    pub fn field(&self, field: SensorField) -> Option<&FieldImputation> {
        self.fields.iter().find(|f| f.field == field)
    }
}

impl fmt::Display for ImputationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mean Imputation:")?;
        for entry in &self.fields {
            writeln!(
                f,
                "  {:<20} mean {:>12.4}  replaced {}",
                entry.field.name(),
                entry.mean,
                entry.replaced
            )?;
        }
        Ok(())
    }
}

/// Replace every missing numeric value with the mean of its field.
///
/// Means are computed over the observed values before any replacement, so
/// each field's mean is unchanged by the imputation. A field without any
/// observed value is an error and leaves the dataset untouched.
pub fn impute_means(dataset: &mut SensorDataset) -> Result<ImputationReport> {
    let mut fields = Vec::with_capacity(SensorField::ALL.len());
    for field in SensorField::ALL {
        fields.push(FieldImputation {
            field,
            mean: dataset.field_mean(field)?,
            replaced: 0,
        });
    }

    for observation in dataset.observations_mut() {
        for entry in fields.iter_mut() {
            let slot = observation.field_mut(entry.field);
            if slot.is_none() {
                *slot = Some(entry.mean);
                entry.replaced += 1;
            }
        }
    }

    for entry in &fields {
        if entry.replaced > 0 {
            log::info!(
                "Imputed {} missing '{}' values with mean {:.4}",
                entry.replaced,
                entry.field,
                entry.mean
            );
        }
    }

    Ok(ImputationReport { fields })
}
