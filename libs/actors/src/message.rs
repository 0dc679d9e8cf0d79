//! Opaque Messages
//!
//! Actors are generic over their message type. Closed protocols use an enum;
//! actors that accept arbitrarily shaped traffic use [`AnyMessage`], which
//! carries the concrete type name so a fallback arm can report what it got.

use std::any::{type_name, Any};
use std::fmt;

/// A boxed payload of any `Send` type
pub struct AnyMessage {
    payload: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl AnyMessage {
    pub fn new<T: Any + Send>(payload: T) -> Self {
        Self {
            payload: Box::new(payload),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the concrete payload type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Take the payload out, or get the message back untouched
    pub fn downcast<T: Any>(self) -> Result<T, AnyMessage> {
        let type_name = self.type_name;
        match self.payload.downcast::<T>() {
            Ok(payload) => Ok(*payload),
            Err(payload) => Err(AnyMessage { payload, type_name }),
        }
    }
}

impl fmt::Debug for AnyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyMessage")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
