// Domain models: desired container spec, observed state, port mappings

mod container;
mod port;

pub use container::{
    ContainerSpec, ContainerState, ContainerStatus, DEFAULT_START_TIMEOUT, Database,
    HEALTH_STARTING,
};
pub use port::PortMapping;
