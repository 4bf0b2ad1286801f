mod api;
mod constants;
mod context;
mod create_or_update;
mod error_policy;
#[cfg(test)]
pub(crate) mod fake_store;
mod labels;
mod object;
mod resource;
mod resource_name;
mod resource_namespace;
mod resource_uid;
mod retry;
mod store;

pub use api::Api;
pub use constants::APP_KUBERNETES_IO_MANAGED_BY_VALUE;
pub use context::Context;
pub use create_or_update::create_or_update;
pub use error_policy::error_policy;
pub use labels::Labels;
pub use object::Object;
pub use resource::Resource;
pub use resource_name::ResourceName;
pub use resource_namespace::ObjectNamespace;
pub use resource_uid::ResourceUid;
pub use retry::RetryPolicy;
pub use store::{Store, is_already_exists, is_conflict};
