//! FDTD core: operator data model, update kernels, engine and run control.

pub mod engine;
pub mod excitation;
pub mod kernels;
pub mod operator;
pub mod parallel;
pub mod simulation;

pub use engine::{Engine, EngineType, CURRENT_LOG_FILE, VOLTAGE_LOG_FILE};
pub use excitation::{ExcitationTable, SourceRecord};
pub use operator::{CurrentCoefficients, Operator, OperatorExtension, VoltageCoefficients};
pub use simulation::{EndCondition, Simulation, SimulationStats};
