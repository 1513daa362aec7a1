//! The short code registry: validation, code generation, and the lifecycle
//! of mappings from creation to deletion or expiry.

pub mod codegen;
pub mod error;
pub mod service;
pub mod validation;

pub use codegen::CodeGenerator;
pub use error::{RegistryError, RegistryResult};
pub use service::Registry;
