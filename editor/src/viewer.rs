/// Permissions that allow editing regions.
pub const EDIT_PERMISSIONS: &[&str] = &["site.editable", "admin.super", "admin.pages"];

/// The identity behind a request, as resolved by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub authenticated: bool,
    /// Host session id. Anti-forgery tokens are bound to it.
    pub session: String,
    pub permissions: Vec<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user<I, S>(session: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Viewer {
            authenticated: true,
            session: session.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// An authenticated viewer holding any of [`EDIT_PERMISSIONS`].
    pub fn is_authorized(&self) -> bool {
        self.authenticated
            && self
                .permissions
                .iter()
                .any(|p| EDIT_PERMISSIONS.contains(&p.as_str()))
    }
}
