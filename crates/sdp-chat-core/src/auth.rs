//! Sign-in state, auth forms and screen guarding

use serde::{Deserialize, Serialize};

use crate::api::LoggedIn;
use crate::state::{User, UserType};

/// Token and profile of the signed-in user, held for the process lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, logged_in: LoggedIn) {
        self.token = Some(logged_in.token);
        self.user = Some(logged_in.user);
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.user_type == UserType::Admin)
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Login,
    Register,
    Chatbot,
    Admin,
}

impl Route {
    /// `/` and unknown paths land on the login screen
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/register" => Route::Register,
            "/chatbot" => Route::Chatbot,
            "/admin" => Route::Admin,
            _ => Route::Login,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Chatbot => "/chatbot",
            Route::Admin => "/admin",
        }
    }
}

/// Where a request for `route` actually ends up given the auth state
pub fn guard(route: Route, auth: &AuthState) -> Route {
    match route {
        Route::Login | Route::Register => route,
        Route::Chatbot if !auth.is_authenticated() => Route::Login,
        Route::Chatbot => Route::Chatbot,
        Route::Admin if !auth.is_authenticated() => Route::Login,
        Route::Admin if !auth.is_admin() => Route::Chatbot,
        Route::Admin => Route::Admin,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("Username is required".to_string());
        }
        if self.password.is_empty() {
            return Err("Password is required".to_string());
        }
        Ok(())
    }
}

/// Registration payload, sent to the backend as-is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub user_type: UserType,
}

impl RegisterForm {
    /// Account types offered on the registration screen
    pub const USER_TYPES: [UserType; 2] = [UserType::Student, UserType::Teacher];

    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("Username is required".to_string());
        }
        if !looks_like_email(&self.email) {
            return Err("Please enter a valid email address".to_string());
        }
        if self.password.is_empty() {
            return Err("Password is required".to_string());
        }
        if !Self::USER_TYPES.contains(&self.user_type) {
            return Err("Please choose Student or Teacher".to_string());
        }
        Ok(())
    }

    /// Cycle between the offered account types
    pub fn toggle_user_type(&mut self) {
        self.user_type = match self.user_type {
            UserType::Student => UserType::Teacher,
            _ => UserType::Student,
        };
    }
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_as(user_type: UserType) -> AuthState {
        let mut auth = AuthState::new();
        auth.sign_in(LoggedIn {
            token: "t".to_string(),
            user: User {
                username: "ana".to_string(),
                email: None,
                user_type,
            },
        });
        auth
    }

    #[test]
    fn test_guard_signed_out() {
        let auth = AuthState::new();
        assert_eq!(guard(Route::Chatbot, &auth), Route::Login);
        assert_eq!(guard(Route::Admin, &auth), Route::Login);
        assert_eq!(guard(Route::Register, &auth), Route::Register);
        assert_eq!(guard(Route::Login, &auth), Route::Login);
    }

    #[test]
    fn test_guard_non_admin_redirected_to_chat() {
        let auth = auth_as(UserType::Teacher);
        assert_eq!(guard(Route::Chatbot, &auth), Route::Chatbot);
        assert_eq!(guard(Route::Admin, &auth), Route::Chatbot);
    }

    #[test]
    fn test_guard_admin() {
        let auth = auth_as(UserType::Admin);
        assert!(auth.is_admin());
        assert_eq!(guard(Route::Admin, &auth), Route::Admin);
    }

    #[test]
    fn test_logout_clears_everything() {
        let mut auth = auth_as(UserType::Student);
        assert_eq!(auth.username(), Some("ana"));
        auth.logout();
        assert_eq!(auth, AuthState::new());
        assert_eq!(guard(Route::Chatbot, &auth), Route::Login);
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::from_path("/"), Route::Login);
        assert_eq!(Route::from_path("/admin/"), Route::Admin);
        assert_eq!(Route::from_path("/nowhere"), Route::Login);
        for route in [Route::Login, Route::Register, Route::Chatbot, Route::Admin] {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn test_login_form_requires_fields() {
        let mut form = LoginForm::default();
        assert!(form.validate().is_err());
        form.username = "ana".to_string();
        assert_eq!(form.validate(), Err("Password is required".to_string()));
        form.password = "pw".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_register_form_validation() {
        let mut form = RegisterForm {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "pw".to_string(),
            user_type: UserType::Student,
        };
        assert!(form.validate().is_ok());

        form.email = "ana.example.com".to_string();
        assert!(form.validate().is_err());
        form.email = "a b@example.com".to_string();
        assert!(form.validate().is_err());
        form.email = "a@b@c".to_string();
        assert!(form.validate().is_err());
        form.email = "ana@example.com".to_string();

        form.user_type = UserType::Admin;
        assert_eq!(
            form.validate(),
            Err("Please choose Student or Teacher".to_string())
        );
    }

    #[test]
    fn test_register_form_wire_format() {
        let mut form = RegisterForm::default();
        form.toggle_user_type();
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["user_type"], "teacher");
        form.toggle_user_type();
        assert_eq!(form.user_type, UserType::Student);
    }
}
