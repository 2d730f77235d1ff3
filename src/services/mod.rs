pub mod admin_service;
pub mod auth_service;
pub mod balance_service;
pub mod claim_service;
pub mod dispute_service;
pub mod leaderboard_service;
pub mod merchant_service;

pub use admin_service::*;
pub use auth_service::*;
pub use balance_service::*;
pub use claim_service::*;
pub use dispute_service::*;
pub use leaderboard_service::*;
pub use merchant_service::*;
