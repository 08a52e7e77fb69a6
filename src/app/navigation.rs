use crate::database::models::Role;

use super::Session;

/// Which screen the interactive session is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    AdminHome(Session),
    DoctorHome(Session),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    LoggedIn(Session),
    Logout,
}

impl Screen {
    /// Pure transition. Events that make no sense on the current screen
    /// leave it unchanged.
    pub fn on(self, event: Event) -> Screen {
        match (self, event) {
            (Screen::Login, Event::LoggedIn(session)) => match session.role {
                Role::Admin => Screen::AdminHome(session),
                Role::Doctor => Screen::DoctorHome(session),
            },
            (Screen::AdminHome(_) | Screen::DoctorHome(_), Event::Logout) => Screen::Login,
            (screen, _) => screen,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Screen::Login => None,
            Screen::AdminHome(s) | Screen::DoctorHome(s) => Some(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session {
            user_id: 7,
            username: "wilson".into(),
            role,
        }
    }

    #[test]
    fn test_login_routes_by_role() {
        let admin = session(Role::Admin);
        assert_eq!(
            Screen::Login.on(Event::LoggedIn(admin.clone())),
            Screen::AdminHome(admin)
        );

        let doctor = session(Role::Doctor);
        assert_eq!(
            Screen::Login.on(Event::LoggedIn(doctor.clone())),
            Screen::DoctorHome(doctor)
        );
    }

    #[test]
    fn test_logout_returns_to_login() {
        assert_eq!(
            Screen::AdminHome(session(Role::Admin)).on(Event::Logout),
            Screen::Login
        );
        assert_eq!(
            Screen::DoctorHome(session(Role::Doctor)).on(Event::Logout),
            Screen::Login
        );
    }

    #[test]
    fn test_invalid_events_are_ignored() {
        assert_eq!(Screen::Login.on(Event::Logout), Screen::Login);

        let home = Screen::DoctorHome(session(Role::Doctor));
        assert_eq!(
            home.clone().on(Event::LoggedIn(session(Role::Admin))),
            home
        );
        assert_eq!(home.session().map(|s| s.user_id), Some(7));
        assert!(Screen::Login.session().is_none());
    }
}
