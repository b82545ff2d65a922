//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod notifier;
pub mod queue;
pub mod server_kernel;
pub mod service_host;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use notifier::LogNotifier;
pub use queue::{next_delivery, Delivery, QueueError, QueueName, RedisWorkQueue};
pub use server_kernel::ServerKernel;
pub use service_host::{Service, ServiceHost};
pub use test_dependencies::TestDependencies;
pub use traits::*;
