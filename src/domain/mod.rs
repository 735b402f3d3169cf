// Domain layer: models and ports. Upstream payloads are typed only as far as the jobs read them.

pub mod model;
pub mod ports;
