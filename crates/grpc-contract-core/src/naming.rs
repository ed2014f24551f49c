//! Naming utilities for generated Go code.
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `Token` | [`derive_instance_name`] | `token` |
//! | `Token` | [`server_type_name`] | `TokenServer` |
//! | `ERC20` | [`is_identifier`] | `true` |

use crate::error::{GenerateError, GenerateResult};

/// Suffix appended to a contract name to form the generated server interface.
pub const SERVER_SUFFIX: &str = "Server";

/// Derive the unexported instance name for a contract type.
///
/// Lower-cases the first character and leaves the rest untouched.
///
/// # Examples
///
/// ```
/// use grpc_contract_core::naming::derive_instance_name;
///
/// assert_eq!(derive_instance_name("Token").unwrap(), "token");
/// assert_eq!(derive_instance_name("ERC20").unwrap(), "eRC20");
/// assert!(derive_instance_name("").is_err());
/// ```
pub fn derive_instance_name(name: &str) -> GenerateResult<String> {
    let mut chars = name.chars();
    match chars.next() {
        None => Err(GenerateError::InvalidName(
            "cannot derive an instance name from an empty name".to_string(),
        )),
        Some(first) => Ok(first.to_lowercase().chain(chars).collect()),
    }
}

/// Name of the generated server interface for a contract.
pub fn server_type_name(contract_name: &str) -> String {
    format!("{contract_name}{SERVER_SUFFIX}")
}

/// Check that a name is usable as a Go identifier in generated code.
///
/// Letters are Unicode alphabetic characters, as in Go and in the
/// post-processor's lexer. The first character must be a letter or `_`; the
/// rest may also be numeric.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Return `Ok(())` when `name` is a non-empty identifier, describing `what`
/// in the error otherwise.
pub(crate) fn require_identifier(what: &str, name: &str) -> GenerateResult<()> {
    if name.is_empty() {
        return Err(GenerateError::InvalidName(format!(
            "{what} must not be empty"
        )));
    }
    if !is_identifier(name) {
        return Err(GenerateError::InvalidName(format!(
            "{what} '{name}' is not a valid identifier"
        )));
    }
    Ok(())
}
