//! Error types for anbar container operations.
//!
//! Three families: unknown-service (a registry id that was never set),
//! construction failures (unknown class, factory not callable, argument
//! arity/type mismatches), and missing-method (a post-construction call
//! naming a method the instance does not expose). Every error carries the
//! offending id, class, or method name.

use std::fmt;

/// Main error type for all anbar operations.
#[derive(Debug, thiserror::Error)]
pub enum AnbarError {
    /// Requested service id was never set in the registry.
    #[error("{}", .0)]
    UnknownService(UnknownServiceError),

    /// No descriptor exists for the class name in the catalog.
    #[error("Unknown class: \"{class}\"\n  Hint: add a TypeDescriptor for \"{class}\" to the catalog")]
    UnknownClass { class: String },

    /// The constructor or custom factory for a class failed.
    #[error("Failed to construct \"{class}\": {source}")]
    ConstructionFailed {
        class: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A lazy custom factory forced to something that is not a callable.
    #[error("Factory for \"{class}\" did not resolve to a callable")]
    NotCallable { class: String },

    /// A call named a method the class does not expose.
    #[error("\"{class}\" has no method named `{method}`")]
    MissingMethod { class: String, method: String },

    /// A method was invoked on an instance whose type has no descriptor.
    #[error("Receiver of `{method}` has no descriptor in the catalog")]
    UndescribedReceiver { method: String },

    /// A constructor or method was given fewer arguments than it needs.
    #[error("Missing argument {index} (expected {expected})")]
    MissingArgument { index: usize, expected: &'static str },

    /// An argument did not hold the type the position requires.
    #[error("Argument {index} is not a {expected}")]
    WrongArgumentType { index: usize, expected: &'static str },

    /// A value did not hold the expected concrete type.
    #[error("Value is not a {expected}")]
    WrongType { expected: &'static str },

    /// A lazy value was forced after its owning container was dropped.
    #[error("The container behind this lazy value has been dropped")]
    ContainerGone,

    /// Escape hatch for application errors raised inside constructors
    /// and custom factories.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Error when a service id was never registered.
///
/// Carries "did you mean?" suggestions over the ids that ARE registered.
#[derive(Debug)]
pub struct UnknownServiceError {
    /// The id that was requested.
    pub id: String,
    /// Registered ids that look similar.
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnknownServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service not registered: \"{}\"", self.id)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - \"{suggestion}\"")?;
            }
        }

        write!(
            f,
            "\n  Hint: set it with `registry.set(\"{}\", ...)` before requesting it",
            self.id
        )
    }
}

/// Convenient Result type for anbar operations.
pub type Result<T> = std::result::Result<T, AnbarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_service_display() {
        let err = AnbarError::UnknownService(UnknownServiceError {
            id: String::from("Logger"),
            suggestions: vec![String::from("AppLogger")],
        });

        let msg = format!("{err}");
        assert!(msg.contains("not registered"));
        assert!(msg.contains("Logger"));
        assert!(msg.contains("Did you mean"));
        assert!(msg.contains("AppLogger"));
    }

    #[test]
    fn unknown_service_without_suggestions() {
        let err = AnbarError::UnknownService(UnknownServiceError {
            id: String::from("Db"),
            suggestions: vec![],
        });

        let msg = format!("{err}");
        assert!(!msg.contains("Did you mean"));
        assert!(msg.contains("Hint"));
    }

    #[test]
    fn construction_failed_carries_source() {
        let source = AnbarError::MissingArgument { index: 1, expected: "i64" };
        let err = AnbarError::ConstructionFailed {
            class: String::from("Database"),
            source: Box::new(source),
        };

        let msg = format!("{err}");
        assert!(msg.contains("Database"));
        assert!(msg.contains("Missing argument 1"));
    }

    #[test]
    fn missing_method_display() {
        let err = AnbarError::MissingMethod {
            class: String::from("Greeter"),
            method: String::from("shout"),
        };
        assert!(format!("{err}").contains("`shout`"));
    }
}
