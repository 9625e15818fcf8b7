//! # Event Bus Module
//!
//! Publish/subscribe feedback channel between the dispatcher and whatever
//! front end is attached to it.
//!
//! ## Overview
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter and receive events of interest
//! - Supports both sync handlers and async broadcast receivers
//!
//! The bus is owned, not global. Construct one per console and hand out
//! `Arc<EventBus>` clones.
//!
//! ## Usage
//!
//! ```rust
//! use armkit_core::event_bus::{AppEvent, ConnectionEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Connection]),
//!     |event| println!("{}", event.description()),
//! );
//!
//! bus.publish(AppEvent::Connection(ConnectionEvent::Connected {
//!     host: "192.168.1.20".to_string(),
//! }));
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
