use thiserror::Error;

#[derive(Debug, Error)]
pub enum PosError {
    #[error("not initialized: run 'pos init'")]
    NotInitialized,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("product already exists: sku {0}")]
    ProductExists(String),

    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid business type: {0}")]
    InvalidBusinessType(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid order type: {0}")]
    InvalidOrderType(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PosError>;
