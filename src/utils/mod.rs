pub mod ip;
pub mod password;
pub mod slug;
pub mod useragent;

pub use ip::extract_client_ip;
pub use password::{hash_password, verify_password};
pub use slug::slugify;
pub use useragent::classify_user_agent;

pub fn generate_secure_token(length: usize) -> String {
    use std::iter;

    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}
