pub mod controller;
pub mod loop_worker;
pub mod route;
pub mod signals;

pub use controller::MonitorController;
pub use route::{MonitorContext, RouteState};
pub use signals::{ActivityState, InteractionEvent};
