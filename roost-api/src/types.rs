use std::future::Future;
use std::pin::Pin;

use crate::errors::ActorError;

// Type aliases for common types
pub type ActorResult<T> = Result<T, ActorError>;
pub type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
