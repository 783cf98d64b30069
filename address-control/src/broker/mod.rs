//! Request/reply brokering: reply-address registry, handler pool, dispatch.

mod handler_pool;
mod reply_registry;
mod request_broker;

pub use handler_pool::{HandlerPool, PoolSaturated};
pub use reply_registry::ReplyRegistry;
pub use request_broker::{
    ControlAddress, HandlerError, RequestBroker, RequestHandler, RequestMessage,
};
