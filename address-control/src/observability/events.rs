//! Canonical structured event names used across `address-control`.

// Connection and session lifecycle events.
pub const CONNECTION_OPEN: &str = "connection_open";
pub const CONNECTION_CLOSE: &str = "connection_close";
pub const CONNECTION_DISCONNECT: &str = "connection_disconnect";
pub const CONNECTION_TEARDOWN: &str = "connection_teardown";
pub const LINK_REJECT_UNKNOWN_ADDRESS: &str = "link_reject_unknown_address";
pub const REPLY_LINK_ASSIGNED: &str = "reply_link_assigned";
pub const REPLY_LINK_REMOVED: &str = "reply_link_removed";

// Request/reply broker events.
pub const REQUEST_DISPATCH: &str = "request_dispatch";
pub const REQUEST_ACCEPTED: &str = "request_accepted";
pub const REQUEST_REJECTED: &str = "request_rejected";
pub const REPLY_SENT: &str = "reply_sent";
pub const REPLY_DROPPED_NO_ROUTE: &str = "reply_dropped_no_route";
pub const REPLY_SEND_FAILED: &str = "reply_send_failed";
pub const HANDLER_POOL_SATURATED: &str = "handler_pool_saturated";

// Resource database and subscription events.
pub const SUBSCRIBE_OK: &str = "subscribe_ok";
pub const SUBSCRIBE_UNKNOWN_ADDRESS: &str = "subscribe_unknown_address";
pub const SUBSCRIPTION_REMOVED: &str = "subscription_removed";
pub const SNAPSHOT_PUSH_OK: &str = "snapshot_push_ok";
pub const SNAPSHOT_PUSH_FAILED: &str = "snapshot_push_failed";
pub const WATCH_BATCH_APPLIED: &str = "watch_batch_applied";
pub const WATCH_SOURCE_ENDED: &str = "watch_source_ended";

// Destination-cluster generation events.
pub const CLUSTER_GENERATE_OK: &str = "cluster_generate_ok";
pub const CLUSTER_GENERATE_FAILED: &str = "cluster_generate_failed";
pub const FLAVOR_WAIT_TIMEOUT: &str = "flavor_wait_timeout";
pub const FLAVOR_SET_REPLACED: &str = "flavor_set_replaced";
