pub mod admin;
pub mod common;
pub mod dispute;
pub mod leaderboard;
pub mod merchant;
pub mod pagination;
pub mod red_envelope;
pub mod transaction;
pub mod upload;
pub mod user;

pub use admin::*;
pub use common::*;
pub use dispute::*;
pub use leaderboard::*;
pub use merchant::*;
pub use pagination::*;
pub use red_envelope::*;
pub use transaction::*;
pub use upload::*;
pub use user::*;
