//! `lineup-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, aggregate traits and the order-key
//! generator used to keep lineup slots sorted.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod order_key;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::{Entity, find_by_id, position_by_id};
pub use error::{DomainError, DomainResult};
pub use id::{EventId, MarkerId, PerformerId, SlotId, SubscriberId};
pub use order_key::{SortKey, key_between};
pub use value_object::ValueObject;
