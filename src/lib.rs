pub mod model;

pub use model::world::World;
