//! Master/slave protocol on top of the message-object controller: identifiers,
//! message object patterns, the role slot table, bring-up, outbound frames,
//! interrupt dispatch, shared storage and the master polling service.
pub mod allocator;
pub mod bus;
pub mod configurator;
pub mod dispatcher;
pub mod encoder;
pub mod identity;
pub mod message_object;
pub mod service;
pub mod slots;
pub mod storage;
