use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {entity} key `{key}`")]
    DuplicateKey { entity: &'static str, key: String },
    #[error("unknown {entity} id {id}")]
    MissingRecord { entity: &'static str, id: u32 },
}

impl StoreError {
    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            entity,
            key: key.into(),
        }
    }

    pub fn missing(entity: &'static str, id: u32) -> Self {
        Self::MissingRecord { entity, id }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
