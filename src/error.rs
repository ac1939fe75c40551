//! Error taxonomy for the inventory core.
//!
//! Process-edge code wraps these in `anyhow` with context; the dispatcher
//! renders them to the requester through their `Display` text.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("required column(s) not found: {}", quoted_list(.missing))]
    Schema { missing: Vec<String> },
    #[error("table is empty")]
    EmptyTable,
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("chat transport error: {0}")]
    Chat(String),
    #[error("credentials error: {0}")]
    Credentials(String),
}

pub type InventoryResult<T> = std::result::Result<T, InventoryError>;

fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_every_missing_column() {
        let err = InventoryError::Schema {
            missing: vec!["Sklad".to_string(), "Soni".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "required column(s) not found: 'Sklad', 'Soni'"
        );
    }

    #[test]
    fn fetch_error_carries_transport_message() {
        let err = InventoryError::Fetch("status 403: quota".to_string());
        assert_eq!(err.to_string(), "fetch failed: status 403: quota");
    }
}
