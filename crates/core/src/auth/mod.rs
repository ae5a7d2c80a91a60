mod none;
mod single_user;
mod traits;
mod types;

pub use none::*;
pub use single_user::*;
pub use traits::*;
pub use types::*;

use crate::config::BotConfig;

/// Factory function to create authenticator from config
///
/// An unset or zero `allowed_user_id` leaves the bot open.
pub fn create_authenticator(config: &BotConfig) -> Box<dyn Authenticator> {
    match config.allowed_user_id {
        Some(user_id) if user_id != 0 => Box::new(SingleUserAuthenticator::new(user_id)),
        _ => Box::new(NoneAuthenticator::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_authenticator_open() {
        let config = BotConfig::default();
        assert_eq!(create_authenticator(&config).method_name(), "none");

        let config = BotConfig {
            allowed_user_id: Some(0),
            ..Default::default()
        };
        assert_eq!(create_authenticator(&config).method_name(), "none");
    }

    #[test]
    fn test_create_authenticator_single_user() {
        let config = BotConfig {
            allowed_user_id: Some(1234),
            ..Default::default()
        };
        assert_eq!(create_authenticator(&config).method_name(), "single_user");
    }
}
