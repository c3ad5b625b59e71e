//! The FDTD engine: field state, excitation, extension dispatch and the
//! time-stepping loop.
//!
//! The engine owns the voltage and current arrays and advances them by
//! alternately applying the two update kernels, with the extension hooks
//! wrapped around each kernel and the soft-source injections closing each
//! half-step. Everything it steps with (coefficients, timestep, excitation
//! table, extension factories) is read once from the [`Operator`] at
//! construction.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use crate::arrays::{Dimensions, VectorField3D};
use crate::extensions::EngineExtension;
use crate::fdtd::excitation::ExcitationTable;
use crate::fdtd::kernels;
use crate::fdtd::operator::{CurrentCoefficients, Operator, VoltageCoefficients};
use crate::fdtd::parallel;
use crate::Result;

/// File name of the voltage-source diagnostic stream.
pub const VOLTAGE_LOG_FILE: &str = "et";
/// File name of the current-source diagnostic stream.
pub const CURRENT_LOG_FILE: &str = "ht";

/// Kernel sweep selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineType {
    /// Single-threaded reference sweep
    #[default]
    Basic,
    /// Rayon-parallel sweep partitioned along x
    Parallel,
}

/// The time-stepping engine.
pub struct Engine {
    volt: VectorField3D,
    curr: VectorField3D,
    num_ts: u64,
    dims: Dimensions,
    dt: f64,
    volt_coeff: VoltageCoefficients,
    curr_coeff: CurrentCoefficients,
    excitation: ExcitationTable,
    extensions: Vec<Box<dyn EngineExtension>>,
    engine_type: EngineType,
    file_et: Option<BufWriter<File>>,
    file_ht: Option<BufWriter<File>>,
}

impl Engine {
    /// Create an engine from an operator, writing the source logs into the
    /// current working directory.
    pub fn new(operator: &Operator, engine_type: EngineType) -> Result<Self> {
        Self::new_in(operator, engine_type, ".")
    }

    /// Create an engine from an operator, writing the source logs `et` and
    /// `ht` into `log_dir`.
    ///
    /// Fields start zeroed, the step counter at zero. The log files are
    /// opened in truncation mode. Operator-side extensions are instantiated
    /// in registration order and sorted by descending priority; a factory
    /// returning `Ok(None)` is skipped, a factory error aborts construction
    /// (the already-opened streams close on unwind).
    pub fn new_in(
        operator: &Operator,
        engine_type: EngineType,
        log_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let dims = operator.dimensions();
        let log_dir = log_dir.as_ref();

        let file_et = BufWriter::new(File::create(log_dir.join(VOLTAGE_LOG_FILE))?);
        let file_ht = BufWriter::new(File::create(log_dir.join(CURRENT_LOG_FILE))?);

        let mut extensions = Vec::new();
        for op_ext in operator.extensions() {
            match op_ext.create_engine_extension()? {
                Some(ext) => extensions.push(ext),
                None => debug!("extension '{}' has no engine part, skipped", op_ext.name()),
            }
        }
        crate::extensions::sort_by_priority(&mut extensions);

        info!(
            "created FDTD engine: {} x {} x {} cells, {} extensions, {:?} sweep",
            dims.nx,
            dims.ny,
            dims.nz,
            extensions.len(),
            engine_type
        );

        Ok(Self {
            volt: VectorField3D::new(dims),
            curr: VectorField3D::new(dims),
            num_ts: 0,
            dims,
            dt: operator.timestep(),
            volt_coeff: operator.voltage_coefficients().clone(),
            curr_coeff: operator.current_coefficients().clone(),
            excitation: operator.excitation().clone(),
            extensions,
            engine_type,
            file_et: Some(file_et),
            file_ht: Some(file_ht),
        })
    }

    /// Advance the simulation by `iter_ts` time steps.
    ///
    /// Each step runs the fixed sequence: pre-voltage hooks, voltage kernel,
    /// post-voltage hooks, apply-voltage hooks, voltage excitation, then the
    /// same for the current phase, then the step counter increments.
    ///
    /// Always returns `true`; the return channel exists so extensions can
    /// eventually veto continuation.
    pub fn iterate(&mut self, iter_ts: u64) -> bool {
        let nx = self.dims.nx;
        for _ in 0..iter_ts {
            self.do_pre_voltage_updates();
            self.update_voltages(0, nx);
            self.do_post_voltage_updates();
            self.do_apply_to_voltages();
            self.apply_voltage_excite();

            self.do_pre_current_updates();
            self.update_currents(0, nx - 1);
            self.do_post_current_updates();
            self.do_apply_to_current();
            self.apply_current_excite();

            self.num_ts += 1;
        }
        true
    }

    /// Run the voltage kernel over an x-slab.
    pub fn update_voltages(&mut self, x_start: usize, x_count: usize) {
        match self.engine_type {
            EngineType::Basic => kernels::update_voltages(
                &mut self.volt,
                &self.curr,
                &self.volt_coeff,
                x_start,
                x_count,
            ),
            EngineType::Parallel => parallel::update_voltages(
                &mut self.volt,
                &self.curr,
                &self.volt_coeff,
                x_start,
                x_count,
            ),
        }
    }

    /// Run the current kernel over an x-slab. The kernel reads voltages at
    /// i+1, so the caller must keep `x_start + x_count <= nx - 1`.
    pub fn update_currents(&mut self, x_start: usize, x_count: usize) {
        match self.engine_type {
            EngineType::Basic => kernels::update_currents(
                &mut self.curr,
                &self.volt,
                &self.curr_coeff,
                x_start,
                x_count,
            ),
            EngineType::Parallel => parallel::update_currents(
                &mut self.curr,
                &self.volt,
                &self.curr_coeff,
                x_start,
                x_count,
            ),
        }
    }

    /// Inject the current sample of every active voltage source and append
    /// this step's voltage signal sample to the `et` stream.
    fn apply_voltage_excite(&mut self) {
        let signal = self.excitation.signal_volt();
        let length = signal.len() as i64;
        for src in self.excitation.voltage_sources() {
            // Signed on purpose: num_ts may still be below the delay.
            let exc_pos = self.num_ts as i64 - src.delay as i64;
            if exc_pos <= 0 || exc_pos > length {
                continue;
            }
            let sample = src.amplitude * signal[(exc_pos - 1) as usize];
            self.volt
                .component_mut(src.direction)
                .add(src.index[0], src.index[1], src.index[2], sample);
        }

        if (self.num_ts as usize) < signal.len() {
            if let Some(file) = self.file_et.as_mut() {
                // Best effort; the stream is only flushed at reset.
                let _ = writeln!(
                    file,
                    "{}\t{}",
                    self.num_ts as f64 * self.dt,
                    signal[self.num_ts as usize]
                );
            }
        }
    }

    /// Current-side counterpart of [`apply_voltage_excite`]; the `ht` time
    /// column sits on the magnetic half-step, (num_ts + 0.5) * dt.
    ///
    /// [`apply_voltage_excite`]: Engine::apply_voltage_excite
    fn apply_current_excite(&mut self) {
        let signal = self.excitation.signal_curr();
        let length = signal.len() as i64;
        for src in self.excitation.current_sources() {
            let exc_pos = self.num_ts as i64 - src.delay as i64;
            if exc_pos <= 0 || exc_pos > length {
                continue;
            }
            let sample = src.amplitude * signal[(exc_pos - 1) as usize];
            self.curr
                .component_mut(src.direction)
                .add(src.index[0], src.index[1], src.index[2], sample);
        }

        if (self.num_ts as usize) < signal.len() {
            if let Some(file) = self.file_ht.as_mut() {
                let _ = writeln!(
                    file,
                    "{}\t{}",
                    (self.num_ts as f64 + 0.5) * self.dt,
                    signal[self.num_ts as usize]
                );
            }
        }
    }

    fn do_pre_voltage_updates(&mut self) {
        for ext in self.extensions.iter_mut().rev() {
            ext.pre_voltage_updates(&mut self.volt, &self.curr, self.num_ts);
        }
    }

    fn do_post_voltage_updates(&mut self) {
        for ext in self.extensions.iter_mut() {
            ext.post_voltage_updates(&mut self.volt, &self.curr, self.num_ts);
        }
    }

    fn do_apply_to_voltages(&mut self) {
        for ext in self.extensions.iter_mut() {
            ext.apply_to_voltages(&mut self.volt, &self.curr, self.num_ts);
        }
    }

    fn do_pre_current_updates(&mut self) {
        for ext in self.extensions.iter_mut().rev() {
            ext.pre_current_updates(&mut self.curr, &self.volt, self.num_ts);
        }
    }

    fn do_post_current_updates(&mut self) {
        for ext in self.extensions.iter_mut() {
            ext.post_current_updates(&mut self.curr, &self.volt, self.num_ts);
        }
    }

    fn do_apply_to_current(&mut self) {
        for ext in self.extensions.iter_mut() {
            ext.apply_to_current(&mut self.curr, &self.volt, self.num_ts);
        }
    }

    /// Number of completed time steps.
    pub fn current_timestep(&self) -> u64 {
        self.num_ts
    }

    /// Grid dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Timestep in seconds.
    pub fn timestep(&self) -> f64 {
        self.dt
    }

    /// Which kernel sweep this engine runs.
    pub fn engine_type(&self) -> EngineType {
        self.engine_type
    }

    /// Read access to the voltage field.
    pub fn volt(&self) -> &VectorField3D {
        &self.volt
    }

    /// Write access to the voltage field (probes and external drivers).
    pub fn volt_mut(&mut self) -> &mut VectorField3D {
        &mut self.volt
    }

    /// Read access to the current field.
    pub fn curr(&self) -> &VectorField3D {
        &self.curr
    }

    /// Write access to the current field.
    pub fn curr_mut(&mut self) -> &mut VectorField3D {
        &mut self.curr
    }

    /// One voltage element.
    pub fn get_volt(&self, direction: usize, i: usize, j: usize, k: usize) -> f32 {
        self.volt.component(direction).get(i, j, k)
    }

    pub fn set_volt(&mut self, direction: usize, i: usize, j: usize, k: usize, value: f32) {
        self.volt.component_mut(direction).set(i, j, k, value);
    }

    /// One current element.
    pub fn get_curr(&self, direction: usize, i: usize, j: usize, k: usize) -> f32 {
        self.curr.component(direction).get(i, j, k)
    }

    pub fn set_curr(&mut self, direction: usize, i: usize, j: usize, k: usize, value: f32) {
        self.curr.component_mut(direction).set(i, j, k, value);
    }

    /// Tear the engine down: drop extensions last-registered-first, flush
    /// and close both diagnostic streams, zero the fields and the clock.
    pub fn reset(&mut self) {
        while let Some(ext) = self.extensions.pop() {
            drop(ext);
        }
        if let Some(mut file) = self.file_et.take() {
            let _ = file.flush();
        }
        if let Some(mut file) = self.file_ht.take() {
            let _ = file.flush();
        }
        self.volt.clear();
        self.curr.clear();
        self.num_ts = 0;
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.reset();
    }
}
