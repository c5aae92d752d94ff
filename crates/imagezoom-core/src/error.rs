use crate::platform::NodeId;

/// Problems the controller detects in the page it is attached to.
///
/// None of these escape the controller's public methods; they are logged and
/// the controller degrades to a sensible fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoomError {
    MissingDimension {
        node: NodeId,
        attribute: &'static str,
    },
    InvalidDimension {
        node: NodeId,
        attribute: &'static str,
        value: String,
    },
    UnknownTopic(String),
}

impl std::fmt::Display for ZoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoomError::MissingDimension { node, attribute } => {
                write!(f, "node {node} has no `{attribute}` attribute")
            }
            ZoomError::InvalidDimension {
                node,
                attribute,
                value,
            } => write!(
                f,
                "node {node} declares `{attribute}=\"{value}\"`, expected a positive number"
            ),
            ZoomError::UnknownTopic(name) => write!(f, "unknown zoom event topic `{name}`"),
        }
    }
}

impl std::error::Error for ZoomError {}
