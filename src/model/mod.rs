//! Domain model.
//!
//! Plain data types shared between the pure core and the data layer.
//! Row-shaped structs live here; sqlx row mapping stays in `db`.

pub mod family;
pub mod grant;
pub mod stat;
pub mod task;
pub mod user;
