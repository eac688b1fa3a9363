use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    /// Displays as the bare status code, which is what ends up on the `Error:` line.
    #[error("{0}")]
    InventoryStatus(u16),
    #[error("<{parent}> element is missing <{element}>")]
    MissingElement {
        parent: String,
        element: &'static str,
    },
    #[error("<{field}> should be an integer, got {value:?}")]
    InvalidCounter { field: &'static str, value: String },
    #[error("malformed XML response: {0}")]
    Xml(#[from] roxmltree::Error),
}
