pub use yumyum_core::{init_logging, AnimationRamp, Metrics, TickContext, Tunables};
pub mod config {
    pub use yumyum_core::config::*;
}
pub mod spatial_hash {
    pub use yumyum_core::spatial_hash::*;
}
pub mod lifecycle {
    pub use yumyum_core::lifecycle::*;
}
pub mod snapshot {
    pub use yumyum_core::snapshot::*;
}
pub mod history {
    pub use yumyum_core::history::*;
}
pub mod systems {
    pub use yumyum_core::systems::*;
}

pub mod state {
    pub use yumyum_data::*;
}

pub mod world;
