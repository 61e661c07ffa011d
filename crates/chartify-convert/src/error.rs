//! Error types for resource processing
//!
//! Every variant carries the identity of the object being processed so a
//! report can point back at the offending manifest.

use chartify_core::{CoreError, Manifest, ObjectRef};
use miette::Diagnostic;
use thiserror::Error;

/// Converter error
#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    /// The processor claimed the object but its body does not parse as that kind
    #[error("{object}: cannot decode as {kind}: {source}")]
    #[diagnostic(
        code(chartify::convert::decode),
        help("the object body does not match the schema of its declared kind")
    )]
    Decode {
        object: ObjectRef,
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The object uses a combination the chart cannot express as values
    #[error("{object}: {field}: {message}")]
    #[diagnostic(
        code(chartify::convert::ambiguous),
        help("split the resource or template this field by hand")
    )]
    Ambiguous {
        object: ObjectRef,
        field: String,
        message: String,
    },

    #[error("{object}: {message}")]
    #[diagnostic(code(chartify::convert::invalid_input))]
    InvalidInput { object: ObjectRef, message: String },

    /// Two objects map to the same template file
    #[error("{object}: template '{filename}' was already generated for {previous}")]
    #[diagnostic(
        code(chartify::convert::duplicate),
        help("objects with the same kind and name in different namespaces cannot share one chart")
    )]
    DuplicateTemplate {
        object: ObjectRef,
        filename: String,
        previous: ObjectRef,
    },

    /// Merging an object's values into the shared document failed
    #[error("{object}: {source}")]
    #[diagnostic(
        code(chartify::convert::values_conflict),
        help("two resources write different values to the same key; rename one of them")
    )]
    ValuesConflict {
        object: ObjectRef,
        #[source]
        source: CoreError,
    },

    #[error("{object}: {source}")]
    #[diagnostic(code(chartify::convert::core))]
    Core {
        object: ObjectRef,
        #[source]
        source: CoreError,
    },
}

impl ConvertError {
    pub fn ambiguous(obj: &Manifest, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ambiguous {
            object: obj.object_ref(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_input(obj: &Manifest, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            object: obj.object_ref(),
            message: message.into(),
        }
    }

    /// Identity of the object the error refers to
    pub fn object(&self) -> &ObjectRef {
        match self {
            Self::Decode { object, .. }
            | Self::Ambiguous { object, .. }
            | Self::InvalidInput { object, .. }
            | Self::DuplicateTemplate { object, .. }
            | Self::ValuesConflict { object, .. }
            | Self::Core { object, .. } => object,
        }
    }

    /// Errors that abort the whole run rather than a single object
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ValuesConflict { .. })
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Attach object identity to core errors
pub(crate) trait ObjectContext<T> {
    fn for_object(self, obj: &Manifest) -> Result<T>;
}

impl<T> ObjectContext<T> for chartify_core::Result<T> {
    fn for_object(self, obj: &Manifest) -> Result<T> {
        self.map_err(|source| ConvertError::Core {
            object: obj.object_ref(),
            source,
        })
    }
}

impl<T> ObjectContext<T> for serde_json::Result<T> {
    fn for_object(self, obj: &Manifest) -> Result<T> {
        self.map_err(|source| ConvertError::Core {
            object: obj.object_ref(),
            source: CoreError::JsonParse(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest::parse_documents("apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n")
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_ambiguous_message() {
        let err = ConvertError::ambiguous(&manifest(), "spec.tls[0].hosts", "two hosts");
        assert_eq!(err.to_string(), "v1 Service web: spec.tls[0].hosts: two hosts");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_values_conflict_is_fatal() {
        let err = ConvertError::ValuesConflict {
            object: manifest().object_ref(),
            source: CoreError::ValuesConflict {
                path: "web.type".into(),
                existing: "\"ClusterIP\"".into(),
                incoming: "\"NodePort\"".into(),
            },
        };
        assert!(err.is_fatal());
        assert_eq!(err.object().name, "web");
    }
}
