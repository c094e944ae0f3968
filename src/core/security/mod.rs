// Security module for path validation and access control
//
// Every path a caller proposes is checked against a blocked list (literal
// paths, directory prefixes and `*` patterns) and, for full operation checks,
// against the workspace boundary.

pub mod path_validator;
pub mod policy;

pub use path_validator::{PathSecurityError, PathValidator, ValidationResult, validate_path};
pub use policy::{ResourceLimits, SecurityPolicy};
