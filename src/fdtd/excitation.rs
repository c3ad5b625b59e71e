//! Soft-source excitation table.
//!
//! Sources are additive: each active source injects `amplitude * sample`
//! into one field component per time step, on top of whatever the update
//! kernels produced. The table carries two independent source sets (voltage
//! side and current side) sharing a pair of equal-length sample vectors.

use crate::{Error, Result};

/// One soft-source injection point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRecord {
    /// Field component direction (0=x, 1=y, 2=z)
    pub direction: usize,
    /// Grid position (i, j, k)
    pub index: [usize; 3],
    /// Amplitude applied to every sample of this source
    pub amplitude: f32,
    /// Per-source start delay, in time-step units
    pub delay: u64,
}

/// Table of voltage- and current-side soft sources plus their signals.
#[derive(Debug, Clone, Default)]
pub struct ExcitationTable {
    volt_sources: Vec<SourceRecord>,
    curr_sources: Vec<SourceRecord>,
    signal_volt: Vec<f32>,
    signal_curr: Vec<f32>,
}

impl ExcitationTable {
    /// Create a table from the two signal sample vectors.
    ///
    /// The vectors must have identical length; the shared length is the
    /// number of live samples every source plays through.
    pub fn new(signal_volt: Vec<f32>, signal_curr: Vec<f32>) -> Result<Self> {
        if signal_volt.len() != signal_curr.len() {
            return Err(Error::Config(format!(
                "signal sample vectors differ in length: {} vs {}",
                signal_volt.len(),
                signal_curr.len()
            )));
        }
        Ok(Self {
            volt_sources: Vec::new(),
            curr_sources: Vec::new(),
            signal_volt,
            signal_curr,
        })
    }

    /// Add a voltage-side source.
    pub fn add_voltage_source(
        &mut self,
        direction: usize,
        index: [usize; 3],
        amplitude: f32,
        delay: u64,
    ) -> Result<()> {
        Self::check_direction(direction)?;
        self.volt_sources.push(SourceRecord {
            direction,
            index,
            amplitude,
            delay,
        });
        Ok(())
    }

    /// Add a current-side source.
    pub fn add_current_source(
        &mut self,
        direction: usize,
        index: [usize; 3],
        amplitude: f32,
        delay: u64,
    ) -> Result<()> {
        Self::check_direction(direction)?;
        self.curr_sources.push(SourceRecord {
            direction,
            index,
            amplitude,
            delay,
        });
        Ok(())
    }

    fn check_direction(direction: usize) -> Result<()> {
        if direction > 2 {
            return Err(Error::Config(format!(
                "source direction must be 0, 1 or 2, got {direction}"
            )));
        }
        Ok(())
    }

    /// Number of signal samples.
    pub fn length(&self) -> usize {
        self.signal_volt.len()
    }

    pub fn voltage_sources(&self) -> &[SourceRecord] {
        &self.volt_sources
    }

    pub fn current_sources(&self) -> &[SourceRecord] {
        &self.curr_sources
    }

    pub fn signal_volt(&self) -> &[f32] {
        &self.signal_volt
    }

    pub fn signal_curr(&self) -> &[f32] {
        &self.signal_curr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_signal_lengths_rejected() {
        let result = ExcitationTable::new(vec![1.0, 0.0], vec![0.0]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_direction_rejected() {
        let mut table = ExcitationTable::new(vec![1.0], vec![0.0]).unwrap();
        assert!(table.add_voltage_source(3, [0, 0, 0], 1.0, 0).is_err());
        assert!(table.add_current_source(7, [0, 0, 0], 1.0, 0).is_err());
        assert!(table.voltage_sources().is_empty());
        assert!(table.current_sources().is_empty());
    }

    #[test]
    fn test_sources_recorded_in_order() {
        let mut table = ExcitationTable::new(vec![1.0, 0.5], vec![0.0, 0.0]).unwrap();
        table.add_voltage_source(0, [1, 2, 3], 2.0, 4).unwrap();
        table.add_voltage_source(2, [3, 2, 1], 0.5, 0).unwrap();
        assert_eq!(table.voltage_sources().len(), 2);
        assert_eq!(table.voltage_sources()[0].index, [1, 2, 3]);
        assert_eq!(table.voltage_sources()[1].direction, 2);
        assert_eq!(table.length(), 2);
    }

    #[test]
    fn test_default_table_is_empty() {
        let table = ExcitationTable::default();
        assert_eq!(table.length(), 0);
        assert!(table.voltage_sources().is_empty());
        assert!(table.current_sources().is_empty());
    }
}
