//! Application services for the status registry.

mod catalog;
mod registry;

pub use catalog::StatusCatalog;
pub use registry::{
    CreateStatusRequest, StatusRegistryError, StatusRegistryResult, StatusRegistryService,
    UpdateStatusRequest,
};
