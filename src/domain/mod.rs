// Domain layer: models and ports. Adapters implement the ports; tasks consume them.

pub mod model;
pub mod ports;
