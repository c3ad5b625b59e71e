//! High-level run control.
//!
//! [`Simulation`] wraps an [`Engine`] and drives [`Engine::iterate`] in
//! fixed-size batches until an end condition is met: a step budget, or the
//! total field energy decaying a given number of dB below its peak. Between
//! batches it samples energy, updates an optional progress bar and keeps
//! throughput statistics.

use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::info;

use crate::fdtd::{Engine, EngineType, Operator};
use crate::Result;

/// When to stop a run.
#[derive(Debug, Clone)]
pub enum EndCondition {
    /// Run for a fixed number of time steps.
    Timesteps(u64),
    /// Run until total energy drops `threshold_db` below its peak, but never
    /// past `max_timesteps`.
    EnergyDecay {
        /// Decay threshold in dB relative to the peak energy
        threshold_db: f64,
        /// Hard upper limit on time steps
        max_timesteps: u64,
    },
}

impl Default for EndCondition {
    fn default() -> Self {
        Self::Timesteps(10_000)
    }
}

/// Statistics from a completed run.
#[derive(Debug, Clone)]
pub struct SimulationStats {
    /// Time steps executed
    pub timesteps: u64,
    /// Simulated time in seconds
    pub sim_time: f64,
    /// Wall clock time in seconds
    pub wall_time: f64,
    /// Peak sampled energy
    pub peak_energy: f64,
    /// Energy at the end of the run
    pub final_energy: f64,
    /// Average speed in million cell updates per second
    pub speed_mcells_per_sec: f64,
}

/// Batched driver around an [`Engine`].
pub struct Simulation {
    engine: Engine,
    end_condition: EndCondition,
    show_progress: bool,
    batch_size: u64,
}

impl Simulation {
    /// Build an engine from the operator and wrap it.
    pub fn new(operator: &Operator, engine_type: EngineType) -> Result<Self> {
        Ok(Self::from_engine(Engine::new(operator, engine_type)?))
    }

    /// Wrap an already-constructed engine.
    pub fn from_engine(engine: Engine) -> Self {
        Self {
            engine,
            end_condition: EndCondition::default(),
            show_progress: true,
            batch_size: 100,
        }
    }

    /// Set the end condition.
    pub fn set_end_condition(&mut self, condition: EndCondition) -> &mut Self {
        self.end_condition = condition;
        self
    }

    /// Enable or disable the progress bar.
    pub fn set_show_progress(&mut self, show: bool) -> &mut Self {
        self.show_progress = show;
        self
    }

    /// Time steps per batch; energy sampling and the decay check happen on
    /// batch boundaries.
    pub fn set_batch_size(&mut self, batch_size: u64) -> &mut Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Run to the end condition and return the statistics.
    pub fn run(&mut self) -> SimulationStats {
        let dims = self.engine.dimensions();
        let dt = self.engine.timestep();

        let (max_timesteps, decay_threshold_db) = match self.end_condition {
            EndCondition::Timesteps(n) => (n, None),
            EndCondition::EnergyDecay {
                threshold_db,
                max_timesteps,
            } => (max_timesteps, Some(threshold_db)),
        };

        info!(
            "FDTD run: {} x {} x {} cells, dt {:.6e} s, up to {} timesteps",
            dims.nx, dims.ny, dims.nz, dt, max_timesteps
        );

        let progress = if self.show_progress {
            let pb = ProgressBar::new(max_timesteps);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec})")
                    .unwrap()
                    .progress_chars("##-"),
            );
            Some(pb)
        } else {
            None
        };

        let start_time = Instant::now();
        let mut peak_energy = 0.0f64;
        let mut final_energy = 0.0f64;
        let mut timesteps_run = 0u64;

        while timesteps_run < max_timesteps {
            let this_batch = (max_timesteps - timesteps_run).min(self.batch_size);
            self.engine.iterate(this_batch);
            timesteps_run += this_batch;

            let energy = self.engine.volt().energy() + self.engine.curr().energy();
            final_energy = energy;
            peak_energy = peak_energy.max(energy);

            if let Some(pb) = &progress {
                pb.set_position(timesteps_run);
            }

            if let Some(threshold_db) = decay_threshold_db {
                if peak_energy > 0.0 && energy > 0.0 {
                    let decay_db = 10.0 * (energy / peak_energy).log10();
                    if decay_db < -threshold_db.abs() {
                        info!(
                            "energy decay reached: {:.1} dB at timestep {}",
                            decay_db, timesteps_run
                        );
                        break;
                    }
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let wall_time = start_time.elapsed().as_secs_f64();
        let speed = if wall_time > 0.0 {
            timesteps_run as f64 * dims.total() as f64 / wall_time / 1e6
        } else {
            0.0
        };

        info!(
            "completed {} timesteps in {:.2}s ({:.2} MC/s)",
            timesteps_run, wall_time, speed
        );

        SimulationStats {
            timesteps: timesteps_run,
            sim_time: timesteps_run as f64 * dt,
            wall_time,
            peak_energy,
            final_energy,
            speed_mcells_per_sec: speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::Dimensions;
    use std::path::PathBuf;

    fn log_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("fdtd-engine-sim").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_fixed_timestep_run() {
        let op = Operator::new(Dimensions::new(4, 4, 4), 1e-12).unwrap();
        let engine = Engine::new_in(&op, EngineType::Basic, log_dir("fixed")).unwrap();
        let mut sim = Simulation::from_engine(engine);
        sim.set_end_condition(EndCondition::Timesteps(250))
            .set_show_progress(false);

        let stats = sim.run();
        assert_eq!(stats.timesteps, 250);
        assert_eq!(sim.engine().current_timestep(), 250);
        assert!((stats.sim_time - 250.0 * 1e-12).abs() < 1e-20);
    }

    #[test]
    fn test_energy_decay_stops_early() {
        // vv = 0.5 halves every voltage each step, so energy drops 6 dB per
        // step and a 20 dB threshold must trip long before the step limit.
        let mut op = Operator::new(Dimensions::new(4, 4, 4), 1e-12).unwrap();
        op.set_uniform_coefficients(0.5, 0.0, 0.5, 0.0);

        let mut engine = Engine::new_in(&op, EngineType::Basic, log_dir("decay")).unwrap();
        engine.set_volt(0, 2, 2, 2, 1.0);

        let mut sim = Simulation::from_engine(engine);
        sim.set_end_condition(EndCondition::EnergyDecay {
            threshold_db: 20.0,
            max_timesteps: 1000,
        })
        .set_batch_size(1)
        .set_show_progress(false);

        let stats = sim.run();
        assert!(stats.timesteps < 1000, "decay never tripped");
        assert!(stats.timesteps > 0);
        assert!(stats.final_energy < stats.peak_energy);
    }
}
