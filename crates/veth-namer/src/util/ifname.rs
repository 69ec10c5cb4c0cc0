//! Interface name limits.

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

/// Error type for interface name validation.
#[derive(Debug, thiserror::Error)]
pub enum IfError {
    #[error("invalid interface name: {0}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, IfError>;

/// Validate an interface name the way the kernel's `dev_valid_name` does.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(IfError::InvalidName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(IfError::InvalidName(format!(
            "name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name == "." || name == ".." {
        return Err(IfError::InvalidName(format!("reserved name: {}", name)));
    }

    if name.contains('/') || name.contains(':') || name.contains('\0') {
        return Err(IfError::InvalidName(
            "name contains invalid characters".to_string(),
        ));
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return Err(IfError::InvalidName("name contains whitespace".to_string()));
    }

    Ok(())
}
