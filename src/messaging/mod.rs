pub mod dispatcher;

pub use dispatcher::{DispatchError, EventDispatcher, InMemoryDispatcher};
