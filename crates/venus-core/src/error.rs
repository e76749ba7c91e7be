use venus_protocol::{ObjectId, ObjectType};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("object {0:?} is not registered")]
    ObjectNotFound(ObjectId),

    #[error("object {0:?} is already registered")]
    DuplicateObject(ObjectId),

    #[error("object {id:?} is a {actual:?}, expected {expected:?}")]
    ObjectTypeMismatch {
        id: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("object {0:?} was already destroyed")]
    ObjectDestroyed(ObjectId),

    #[error("configuration error: {0}")]
    Config(String),
}
