//! The `transport` module exposes hookhub's commands over WebSockets.
//!
//! It defines the JSON protocol (`message`), maps each command onto the
//! services and their errors onto reply kinds (`handler`), and runs the
//! WebSocket server itself (`websocket`).

pub mod handler;
pub mod message;
pub mod websocket;
