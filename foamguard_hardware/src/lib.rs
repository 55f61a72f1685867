pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod sim;

pub use sim::{SimFoamKind, SimFoamProbe, SimPump, SimReservoir, SimSwitches};
