use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Entity types a repository can serve; implemented for every serde model
pub trait Model: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static {}

impl<T> Model for T where T: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static {}
