use crate::{navigation::landing_route, session::Session};

/// Public Route Table
///
/// Routes that must render without an identity. The login and registration screens
/// live here, as does the home route, which never renders content of its own: it
/// only decides where to send the visitor.
pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/auth/login";
pub const REGISTER_ROUTE: &str = "/auth/register";

/// home_redirect
///
/// Where `/` sends the visitor: nowhere yet while the session is resolving, the
/// role's landing route when signed in, the login route otherwise.
pub fn home_redirect(session: &Session) -> Option<&'static str> {
    if session.is_resolving {
        return None;
    }
    Some(match &session.identity {
        Some(identity) => landing_route(&identity.role),
        None => LOGIN_ROUTE,
    })
}
