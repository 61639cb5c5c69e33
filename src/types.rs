use std::sync::{Arc, RwLock};

use crate::error::SmallError;

/// Type alias, not a new type: cannot define methods on it directly, but it
/// names the shared-mutable-state pattern used throughout the core.
pub type Pod<T> = Arc<RwLock<T>>;

pub type SmallResult = Result<(), SmallError>;
pub type ResultPod<T> = Result<Pod<T>, SmallError>;
