use std::sync::Once;

use gradewatch_core::{action_for, classify, PageProbe, PageState, SessionAction};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(portal_logging::initialize_for_tests);
}

#[test]
fn challenge_overrides_login_marker() {
    init_logging();
    let probe = PageProbe {
        challenge: true,
        login_form: true,
        ..PageProbe::default()
    };

    assert_eq!(classify(&probe), PageState::CaptchaBlocked);
}

#[test]
fn login_marker_alone_is_logged_out() {
    init_logging();
    let probe = PageProbe {
        login_form: true,
        ..PageProbe::default()
    };

    assert_eq!(classify(&probe), PageState::LoggedOut);
}

#[test]
fn hidden_consent_modal_is_not_consent_state() {
    init_logging();
    // The modal sits in the DOM on most pages; only a visible one counts.
    let probe = PageProbe {
        consent_present: true,
        consent_visible: false,
        main_menu: true,
        ..PageProbe::default()
    };

    assert_eq!(classify(&probe), PageState::MainMenu);
}

#[test]
fn visible_consent_modal_wins_over_menu() {
    init_logging();
    let probe = PageProbe {
        consent_present: true,
        consent_visible: true,
        main_menu: true,
        ..PageProbe::default()
    };

    assert_eq!(classify(&probe), PageState::ConsentForm);
}

#[test]
fn results_marker_is_terminal_state() {
    init_logging();
    let probe = PageProbe {
        results_table: true,
        ..PageProbe::default()
    };

    let state = classify(&probe);
    assert_eq!(state, PageState::ResultsView);
    assert_eq!(action_for(state), SessionAction::ExtractResults);
}

#[test]
fn empty_probe_is_unknown() {
    init_logging();
    let state = classify(&PageProbe::default());
    assert_eq!(state, PageState::Unknown);
    assert_eq!(action_for(state), SessionAction::Reload);
}

#[test]
fn transition_table_is_total() {
    init_logging();
    let states = [
        (PageState::CaptchaBlocked, SessionAction::RecreateSession),
        (PageState::LoggedOut, SessionAction::PerformLogin),
        (PageState::ConsentForm, SessionAction::DismissConsent),
        (PageState::MainMenu, SessionAction::NavigateToResults),
        (PageState::ResultsView, SessionAction::ExtractResults),
        (PageState::Unknown, SessionAction::Reload),
    ];
    for (state, action) in states {
        assert_eq!(action_for(state), action);
    }
}
