//! Yee-grid FDTD time-stepping engine.
//!
//! This crate implements the core of a three-dimensional finite-difference
//! time-domain field solver: the discrete voltage and current state arrays,
//! the staggered-grid update kernels, soft-source excitation, and a
//! priority-ordered extension protocol that lets auxiliary physics (absorbing
//! boundaries, lumped elements, dispersive materials, probes) observe and
//! modify the fields around each half-step.
//!
//! The crate deliberately does not own the material model: an [`fdtd::Operator`]
//! carries the pre-computed per-cell update coefficients, the timestep and the
//! excitation table, and the [`fdtd::Engine`] only reads from it.
//!
//! # Example
//!
//! ```
//! use fdtd_engine::arrays::Dimensions;
//! use fdtd_engine::fdtd::{Engine, EngineType, Operator};
//!
//! let op = Operator::new(Dimensions::new(8, 8, 8), 1e-12).unwrap();
//! let mut engine = Engine::new_in(&op, EngineType::Basic, std::env::temp_dir()).unwrap();
//! engine.iterate(100);
//! assert_eq!(engine.current_timestep(), 100);
//! ```

pub mod arrays;
pub mod extensions;
pub mod fdtd;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid grid, coefficient or excitation configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failure to open or create a diagnostic stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An operator-side extension factory failed fatally.
    #[error("extension setup failed: {0}")]
    ExtensionSetup(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
