/// Marker observations read from the live page in one probe pass.
///
/// Which DOM element backs each flag is the port implementation's concern;
/// classification only looks at the booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageProbe {
    /// Anti-automation challenge marker.
    pub challenge: bool,
    /// Login form marker.
    pub login_form: bool,
    /// Consent modal exists in the DOM.
    pub consent_present: bool,
    /// Consent modal is actually displayed.
    pub consent_visible: bool,
    /// Main menu marker.
    pub main_menu: bool,
    /// Results grid marker.
    pub results_table: bool,
}

/// Where the session currently is, as a closed set of page states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    CaptchaBlocked,
    LoggedOut,
    ConsentForm,
    MainMenu,
    ResultsView,
    Unknown,
}

/// What the session runner must do in a given page state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    RecreateSession,
    PerformLogin,
    DismissConsent,
    NavigateToResults,
    ExtractResults,
    Reload,
}

/// Classifies a probe into a page state. First match wins; the
/// anti-automation challenge overrides everything else on the page.
pub fn classify(probe: &PageProbe) -> PageState {
    if probe.challenge {
        return PageState::CaptchaBlocked;
    }
    if probe.login_form {
        return PageState::LoggedOut;
    }
    if probe.consent_present && probe.consent_visible {
        return PageState::ConsentForm;
    }
    if probe.main_menu {
        return PageState::MainMenu;
    }
    if probe.results_table {
        return PageState::ResultsView;
    }
    PageState::Unknown
}

/// The transition table: every state maps to exactly one action.
/// `ResultsView` is the terminal state; its action ends the run.
pub fn action_for(state: PageState) -> SessionAction {
    match state {
        PageState::CaptchaBlocked => SessionAction::RecreateSession,
        PageState::LoggedOut => SessionAction::PerformLogin,
        PageState::ConsentForm => SessionAction::DismissConsent,
        PageState::MainMenu => SessionAction::NavigateToResults,
        PageState::ResultsView => SessionAction::ExtractResults,
        PageState::Unknown => SessionAction::Reload,
    }
}
