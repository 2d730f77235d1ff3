//! 客户端数据状态：请求序号守卫、单值资源与分页列表

pub mod guard;
pub mod paged;
pub mod resource;

pub use guard::{RequestGuard, RequestToken};
pub use paged::{PageSource, PagedState, PagedStore};
pub use resource::{Resource, ResourceState};
