/// Portal credentials for one watched account.
///
/// Loaded from the accounts file at startup and immutable for the process
/// lifetime. The label doubles as the department name in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub label: String,
    pub username: String,
    pub password: String,
}

impl Account {
    pub fn new(
        label: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}
