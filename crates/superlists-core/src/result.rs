use crate::error::SuperListsError;

pub type SuperListsResult<T> = Result<T, SuperListsError>;
