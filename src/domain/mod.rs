// Domain layer: customer records, segments and the warehouse port.

pub mod model;
pub mod ports;
