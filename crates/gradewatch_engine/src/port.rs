use std::fmt;

use gradewatch_core::PageProbe;

/// Input fields the session fills during login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
    Captcha,
}

/// Clickable controls the session drives.
///
/// The three `Menu*` controls are the fixed navigation sequence from the
/// main menu to the results listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Login,
    ConsentAccept,
    MenuGrades,
    MenuExamResults,
    MenuShowAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalError {
    pub kind: PortalFaultKind,
    pub message: String,
}

impl PortalError {
    pub fn new(kind: PortalFaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PortalError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalFaultKind {
    MissingElement,
    StalePage,
    Timeout,
    ConnectionLost,
    Driver,
}

impl fmt::Display for PortalFaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalFaultKind::MissingElement => write!(f, "missing element"),
            PortalFaultKind::StalePage => write!(f, "stale page"),
            PortalFaultKind::Timeout => write!(f, "timeout"),
            PortalFaultKind::ConnectionLost => write!(f, "connection lost"),
            PortalFaultKind::Driver => write!(f, "driver error"),
        }
    }
}

/// One authenticated portal connection for one account.
///
/// Implementations wrap whatever automation backend actually drives the
/// page. Calls block; each is expected to wrap a short explicit wait
/// (around five seconds) on the element it touches. `click` on
/// `Control::ConsentAccept` must wait for the modal to disappear before
/// returning.
pub trait PortalPage: Send {
    /// Reads the marker set of the current page in one pass.
    fn probe(&mut self) -> Result<PageProbe, PortalError>;

    fn fill(&mut self, field: Field, value: &str) -> Result<(), PortalError>;

    fn click(&mut self, control: Control) -> Result<(), PortalError>;

    /// Raster bytes of the cropped CAPTCHA region on the login page.
    fn captcha_image(&mut self) -> Result<Vec<u8>, PortalError>;

    fn reload(&mut self) -> Result<(), PortalError>;

    /// Outer HTML of the results grid. Only meaningful on the results page.
    fn results_table_html(&mut self) -> Result<String, PortalError>;
}

/// Opens fresh portal connections at the login page.
///
/// Used once at session start and again for the full teardown/reconnect
/// when the anti-automation challenge fires.
pub trait PortalConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn PortalPage>, PortalError>;
}

/// Black-box numeric recognition for the login CAPTCHA.
pub trait CaptchaOracle: Send + Sync {
    /// Returns the recognized value, or `None` when the image could not be
    /// read. `None` must never be submitted as an answer; the caller
    /// reloads the page and retries the login step.
    fn recognize(&self, image: &[u8]) -> Option<u32>;
}
