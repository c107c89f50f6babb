//! Blog domain objects and the field rules they enforce.

mod post;
mod rights;
mod summary;
pub mod timestamp;
pub mod validate;

pub use post::{Post, PostDict};
pub use rights::{PostRights, PostRightsDict};
pub use summary::{PostSummary, PostSummaryDict};
pub use validate::{Limits, ValidationError, ValidationResult};
