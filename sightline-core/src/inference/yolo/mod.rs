pub mod model;
pub mod session;

pub use model::{Yolo, YoloConfig};
pub use session::YoloSession;
