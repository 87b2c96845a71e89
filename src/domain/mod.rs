// Domain module: models, instances and the solver port

pub mod basis;
pub mod cutting_stock;
pub mod lot_sizing;
pub mod models;
pub mod session;
pub mod solver_service;
pub mod value_objects;

pub use basis::*;
pub use cutting_stock::*;
pub use lot_sizing::*;
pub use models::*;
pub use session::*;
pub use solver_service::*;
pub use value_objects::*;
