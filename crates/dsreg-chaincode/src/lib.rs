//! Invocation surface for the dataset registry.
//!
//! A [`Chaincode`] receives a function name and ordered string arguments,
//! routes them to the entity stores of `dsreg-ledger`, and answers with a
//! [`Response`]. [`bootstrap::init`] seeds the users named in
//! [`ChaincodeConfig`].

pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod response;

pub use config::{ChaincodeConfig, SeedUser};
pub use dispatcher::{Chaincode, Function};
pub use error::{ChaincodeError, ChaincodeResult};
pub use response::{Response, Status};
