pub mod dispatcher;
pub mod generator;
pub mod routes;
pub mod simulation;

pub use dispatcher::{DispatchOutcome, ReadingDispatcher};
pub use generator::{ReadingGenerator, ValueKind};
pub use simulation::{Simulation, SimulationConfig, SimulationState, Target, TickReport};
