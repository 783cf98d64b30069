//! Concrete request handlers for the control endpoint's well-known
//! addresses.

mod addressing;
mod flavors;

pub use addressing::{AddressEntry, AddressManager, AddressingHandler, ManagerError};
pub use flavors::{FlavorEntry, FlavorsHandler};
