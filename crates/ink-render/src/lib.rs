pub mod hit;
pub mod route;

pub use hit::{Hit, HitTolerance, hit_test, hit_test_rect};
pub use route::{Route, connection_route};
