// Domain layer: card schema, records, the aggregate table and the ports the pipeline talks through.

pub mod model;
pub mod ports;
