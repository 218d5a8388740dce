pub mod claims;
mod current_user;

pub use claims::Keys;
pub use current_user::CurrentUser;
