//! Service paths and transport header names.

pub const REQUEST_AUTHENTICATION_STATE: &str = "/api/ApplicationAPI/RequestAuthenticationState";
pub const REGISTER_USER: &str = "/api/ApplicationAPI/RegisterUser";
pub const VERIFY_USER_OTP: &str = "/api/ApplicationAPI/VerifyUserOTP";
pub const DELETE_USER: &str = "/api/ApplicationAPI/DeleteUser";
pub const HELLO_WORLD: &str = "/api/ApplicationAPI/HelloWorld";

/// Query parameter carrying `{directory}\{user}` on delete.
pub const DELETE_USER_QUERY: &str = "userName";

pub const HEADER_APPLICATION_ID: &str = "X-Application-Id";
pub const HEADER_EPOCH: &str = "X-Epoch";
pub const HEADER_REQUEST_SECRET: &str = "X-Request-Secret";
pub const HEADER_REMOTE_IP: &str = "X-Remote-Ip";

/// Qualified user name used by the delete endpoint.
pub fn qualified_user_name(directory: Option<&str>, user_name: &str) -> String {
    match directory.filter(|d| !d.is_empty()) {
        Some(dir) => format!("{}\\{}", dir, user_name),
        None => user_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_user_name() {
        assert_eq!(qualified_user_name(Some("staff"), "alice"), "staff\\alice");
        assert_eq!(qualified_user_name(Some(""), "alice"), "alice");
        assert_eq!(qualified_user_name(None, "alice"), "alice");
    }
}
