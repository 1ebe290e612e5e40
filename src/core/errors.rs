//=========================================================================
// Error Types
//=========================================================================
//
// Error enums shared by the engine core, the object tree and the asset
// pipeline.
//
// Policy:
//   - Programmer errors surface synchronously as named variants
//   - Handler failures abort the current publish and propagate upward
//   - Asset failures are stored on the asset and re-raised on load()
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::objects::ObjectId;
use crate::platform::PlatformError;

//=== Aliases =============================================================

/// Boxed error carried out of user event handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of every event handler.
pub type HandlerResult = Result<(), BoxError>;

//=== EngineError =========================================================

/// Errors raised by the engine runtime.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `enter()` was called on an engine that is already entered.
    #[error("engine is already entered")]
    AlreadyEntered,

    /// An operation that needs live subsystems ran outside `enter()`/`exit()`.
    #[error("engine is not entered")]
    NotEntered,

    /// `start()` found no starting scene (it was already consumed).
    #[error("engine has no starting scene")]
    NoStartingScene,

    /// A handler was registered under the name derived for `event`, but it
    /// cannot accept that event (or that receiver).
    #[error("bad event handler: {object}.{method} cannot handle {event}")]
    BadEventHandler {
        object: &'static str,
        method: String,
        event: &'static str,
    },

    /// Error returned from the body of an event handler.
    #[error(transparent)]
    Handler(BoxError),

    /// A subsystem failed to construct, acquire or release its resources.
    #[error("subsystem {name} failed: {source}")]
    Subsystem {
        name: &'static str,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl EngineError {
    /// Wraps an error coming out of a handler body.
    ///
    /// Engine errors travel through handlers unchanged; everything else is
    /// carried as [`EngineError::Handler`].
    pub(crate) fn from_handler(error: BoxError) -> Self {
        match error.downcast::<EngineError>() {
            Ok(engine_error) => *engine_error,
            Err(other) => EngineError::Handler(other),
        }
    }
}

//=== ObjectError =========================================================

/// Errors raised by the game-object tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// The object is not a child of this container.
    #[error("object {0:?} is not present in this container")]
    NotPresent(ObjectId),

    /// `get` was called without a kind or a tag.
    #[error("get() requires a kind, a tag, or both")]
    NoSelector,
}

//=== AssetError ==========================================================

/// Errors raised while loading an asset.
///
/// Stored on the asset once loading fails and cloned out to every caller
/// of `load()`.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// The file does not exist and the asset kind has no fallback.
    #[error("asset {name:?} not found")]
    NotFound { name: String },

    /// The filesystem failed for a reason other than a missing file.
    #[error("failed to read asset {name:?}: {source}")]
    Io {
        name: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// `background_parse` rejected the data.
    #[error("failed to parse asset {name:?}: {message}")]
    Parse { name: String, message: String },

    /// The loader shut down before the asset was picked up.
    #[error("loading of asset {name:?} was cancelled")]
    Cancelled { name: String },

    /// `load()` gave up waiting.
    #[error("timed out waiting for asset {name:?}")]
    Timeout { name: String },

    /// The background worker panicked while producing the asset.
    #[error("background load of asset {name:?} panicked")]
    Panicked { name: String },

    /// An animation pattern could not be expanded.
    #[error("invalid frame pattern {pattern:?}: {reason}")]
    BadPattern { pattern: String, reason: &'static str },
}

impl AssetError {
    /// Builds a parse error from any displayable cause.
    pub fn parse(name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        AssetError::Parse {
            name: name.into(),
            message: cause.to_string(),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_event_handler_names_object_method_and_event() {
        let error = EngineError::BadEventHandler {
            object: "game::Player",
            method: "on_update".to_string(),
            event: "KeyPressed",
        };
        let text = error.to_string();
        assert!(text.contains("game::Player"));
        assert!(text.contains("on_update"));
        assert!(text.contains("KeyPressed"));
    }

    #[test]
    fn engine_errors_pass_through_handlers_unwrapped() {
        let boxed: BoxError = Box::new(EngineError::NoStartingScene);
        let error = EngineError::from_handler(boxed);
        assert!(matches!(error, EngineError::NoStartingScene));
    }

    #[test]
    fn foreign_errors_are_carried_transparently() {
        let boxed: BoxError = "boom".into();
        let error = EngineError::from_handler(boxed);
        assert!(matches!(error, EngineError::Handler(_)));
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn asset_errors_are_cloneable() {
        let error = AssetError::parse("hero.png", "bad header");
        let copy = error.clone();
        assert_eq!(error.to_string(), copy.to_string());
    }
}
