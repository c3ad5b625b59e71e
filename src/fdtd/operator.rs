//! The FDTD operator: per-cell update coefficients and excitation setup.
//!
//! The operator is the read-only collaborator of the engine. Whatever
//! discretisation produced it (mesh, materials, boundary setup) happens
//! outside this crate; the engine only consumes grid dimensions, the
//! timestep, the four coefficient arrays and the excitation table, and asks
//! operator-side extensions to create their engine-side counterparts.

use crate::arrays::{Dimensions, Field3D};
use crate::extensions::EngineExtension;
use crate::fdtd::excitation::ExcitationTable;
use crate::{Error, Result};

/// Voltage-update coefficients.
///
/// `vv` scales the previous voltage (unitless), `vi` is the gain on the
/// current curl (carries the timestep).
#[derive(Debug, Clone)]
pub struct VoltageCoefficients {
    /// Voltage self-scaling, per direction
    pub vv: [Field3D; 3],
    /// Gain on the current curl, per direction
    pub vi: [Field3D; 3],
}

impl VoltageCoefficients {
    /// Identity coefficients: vv = 1, vi = 0 (a step leaves voltages alone).
    pub fn identity(dims: Dimensions) -> Self {
        let mut vv = [
            Field3D::new(dims),
            Field3D::new(dims),
            Field3D::new(dims),
        ];
        for component in &mut vv {
            component.fill(1.0);
        }
        Self {
            vv,
            vi: [
                Field3D::new(dims),
                Field3D::new(dims),
                Field3D::new(dims),
            ],
        }
    }
}

/// Current-update coefficients.
///
/// `ii` scales the previous current, `iv` is the gain on the voltage curl.
#[derive(Debug, Clone)]
pub struct CurrentCoefficients {
    /// Current self-scaling, per direction
    pub ii: [Field3D; 3],
    /// Gain on the voltage curl, per direction
    pub iv: [Field3D; 3],
}

impl CurrentCoefficients {
    /// Identity coefficients: ii = 1, iv = 0.
    pub fn identity(dims: Dimensions) -> Self {
        let mut ii = [
            Field3D::new(dims),
            Field3D::new(dims),
            Field3D::new(dims),
        ];
        for component in &mut ii {
            component.fill(1.0);
        }
        Self {
            ii,
            iv: [
                Field3D::new(dims),
                Field3D::new(dims),
                Field3D::new(dims),
            ],
        }
    }
}

/// Operator-side extension descriptor.
///
/// The operator owns a list of these; at engine init each is asked to create
/// its engine-side part. Returning `Ok(None)` means this extension has no
/// engine-side work and is skipped; returning an error aborts engine
/// construction.
pub trait OperatorExtension {
    /// Extension name for logging and error messages.
    fn name(&self) -> &str;

    /// Create the engine-side extension, or `None` to skip.
    fn create_engine_extension(&self) -> Result<Option<Box<dyn EngineExtension>>>;
}

/// Read-only provider of everything the engine needs to step fields.
pub struct Operator {
    dims: Dimensions,
    dt: f64,
    volt_coeff: VoltageCoefficients,
    curr_coeff: CurrentCoefficients,
    excitation: ExcitationTable,
    extensions: Vec<Box<dyn OperatorExtension>>,
}

impl Operator {
    /// Create an operator with identity coefficients and no sources.
    ///
    /// Each grid dimension must be at least 2 and the timestep must be a
    /// positive finite number of seconds.
    pub fn new(dims: Dimensions, dt: f64) -> Result<Self> {
        if dims.nx < 2 || dims.ny < 2 || dims.nz < 2 {
            return Err(Error::Config(format!(
                "each grid dimension must be >= 2, got {} x {} x {}",
                dims.nx, dims.ny, dims.nz
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(Error::Config(format!("timestep must be positive, got {dt}")));
        }
        Ok(Self {
            dims,
            dt,
            volt_coeff: VoltageCoefficients::identity(dims),
            curr_coeff: CurrentCoefficients::identity(dims),
            excitation: ExcitationTable::default(),
            extensions: Vec::new(),
        })
    }

    /// Grid dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Timestep in seconds.
    pub fn timestep(&self) -> f64 {
        self.dt
    }

    pub fn voltage_coefficients(&self) -> &VoltageCoefficients {
        &self.volt_coeff
    }

    /// Mutable access for discretisation code filling in the coefficients.
    pub fn voltage_coefficients_mut(&mut self) -> &mut VoltageCoefficients {
        &mut self.volt_coeff
    }

    pub fn current_coefficients(&self) -> &CurrentCoefficients {
        &self.curr_coeff
    }

    pub fn current_coefficients_mut(&mut self) -> &mut CurrentCoefficients {
        &mut self.curr_coeff
    }

    /// Set all four coefficient arrays to spatially uniform values.
    ///
    /// Convenience for homogeneous media and for tests and benchmarks.
    pub fn set_uniform_coefficients(&mut self, vv: f32, vi: f32, ii: f32, iv: f32) {
        for d in 0..3 {
            self.volt_coeff.vv[d].fill(vv);
            self.volt_coeff.vi[d].fill(vi);
            self.curr_coeff.ii[d].fill(ii);
            self.curr_coeff.iv[d].fill(iv);
        }
    }

    /// Install the excitation table, checking every source index against the
    /// grid.
    pub fn set_excitation(&mut self, table: ExcitationTable) -> Result<()> {
        for src in table.voltage_sources().iter().chain(table.current_sources()) {
            let [i, j, k] = src.index;
            if i >= self.dims.nx || j >= self.dims.ny || k >= self.dims.nz {
                return Err(Error::Config(format!(
                    "source index ({i}, {j}, {k}) outside grid {} x {} x {}",
                    self.dims.nx, self.dims.ny, self.dims.nz
                )));
            }
        }
        self.excitation = table;
        Ok(())
    }

    pub fn excitation(&self) -> &ExcitationTable {
        &self.excitation
    }

    /// Register an operator-side extension. Engine-side parts are created,
    /// in registration order, when an engine is built from this operator.
    pub fn add_extension(&mut self, extension: Box<dyn OperatorExtension>) {
        self.extensions.push(extension);
    }

    pub fn extensions(&self) -> &[Box<dyn OperatorExtension>] {
        &self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_grid_rejected() {
        assert!(Operator::new(Dimensions::new(1, 4, 4), 1e-12).is_err());
        assert!(Operator::new(Dimensions::new(4, 4, 0), 1e-12).is_err());
        assert!(Operator::new(Dimensions::new(2, 2, 2), 1e-12).is_ok());
    }

    #[test]
    fn test_invalid_timestep_rejected() {
        let dims = Dimensions::new(4, 4, 4);
        assert!(Operator::new(dims, 0.0).is_err());
        assert!(Operator::new(dims, -1e-12).is_err());
        assert!(Operator::new(dims, f64::NAN).is_err());
    }

    #[test]
    fn test_identity_coefficients_by_default() {
        let op = Operator::new(Dimensions::new(3, 3, 3), 1e-12).unwrap();
        for d in 0..3 {
            assert!(op.voltage_coefficients().vv[d].as_slice().iter().all(|&v| v == 1.0));
            assert!(op.voltage_coefficients().vi[d].as_slice().iter().all(|&v| v == 0.0));
            assert!(op.current_coefficients().ii[d].as_slice().iter().all(|&v| v == 1.0));
            assert!(op.current_coefficients().iv[d].as_slice().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_out_of_grid_source_rejected() {
        let mut op = Operator::new(Dimensions::new(4, 4, 4), 1e-12).unwrap();
        let mut table = ExcitationTable::new(vec![1.0], vec![0.0]).unwrap();
        table.add_voltage_source(0, [4, 0, 0], 1.0, 0).unwrap();
        assert!(op.set_excitation(table).is_err());

        let mut table = ExcitationTable::new(vec![1.0], vec![0.0]).unwrap();
        table.add_current_source(1, [3, 3, 3], 1.0, 0).unwrap();
        assert!(op.set_excitation(table).is_ok());
    }

    #[test]
    fn test_uniform_coefficients() {
        let mut op = Operator::new(Dimensions::new(3, 3, 3), 1e-12).unwrap();
        op.set_uniform_coefficients(0.5, 0.25, 0.75, 0.125);
        assert_eq!(op.voltage_coefficients().vv[1].get(1, 1, 1), 0.5);
        assert_eq!(op.voltage_coefficients().vi[2].get(0, 2, 1), 0.25);
        assert_eq!(op.current_coefficients().ii[0].get(2, 0, 0), 0.75);
        assert_eq!(op.current_coefficients().iv[1].get(1, 2, 2), 0.125);
    }
}
