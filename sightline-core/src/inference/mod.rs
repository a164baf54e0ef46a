pub mod decode;
pub mod mapper;
pub mod model;
pub mod nms;
pub mod pool;
pub mod tensor;
pub mod yolo;
