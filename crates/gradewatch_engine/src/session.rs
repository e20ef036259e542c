use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gradewatch_core::{action_for, classify, Account, ScrapeResult, SessionAction};
use portal_logging::{watch_debug, watch_info, watch_warn};
use thiserror::Error;

use crate::extract::{extract_results, ExtractError};
use crate::port::{CaptchaOracle, Control, Field, PortalConnector, PortalError, PortalPage};

/// Bounds for the retry-by-reload loop of one session run.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Faults tolerated within a single run before giving up.
    pub max_faults: u32,
    /// Base backoff; the sleep grows linearly with the fault count.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_faults: 8,
            backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("retries exhausted after {faults} faults, last: {last}")]
    RetriesExhausted { faults: u32, last: String },
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("cancelled")]
    Cancelled,
}

enum StepOutcome {
    Done(ScrapeResult),
    Continue,
    /// The step handled its own recovery (reload or teardown); the caller
    /// only charges the fault budget and backs off.
    Retry(String),
}

enum StepError {
    Transient(PortalError),
    Fatal(SessionError),
}

impl From<PortalError> for StepError {
    fn from(err: PortalError) -> Self {
        StepError::Transient(err)
    }
}

/// Drives one account's session through the page states until the results
/// view is reached.
///
/// The underlying connection is lazily opened and torn down wholesale when
/// the anti-automation challenge fires. All faults within one `run` share a
/// single bounded budget.
pub struct SessionRunner {
    connector: Arc<dyn PortalConnector>,
    oracle: Arc<dyn CaptchaOracle>,
    policy: RetryPolicy,
    page: Option<Box<dyn PortalPage>>,
}

impl SessionRunner {
    pub fn new(
        connector: Arc<dyn PortalConnector>,
        oracle: Arc<dyn CaptchaOracle>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            connector,
            oracle,
            policy,
            page: None,
        }
    }

    /// Classify-act loop: runs until the results view yields a scrape, the
    /// fault budget is exhausted, or `cancel` is raised.
    pub fn run(
        &mut self,
        account: &Account,
        cancel: &AtomicBool,
    ) -> Result<ScrapeResult, SessionError> {
        // A session surviving from the previous cycle starts from a fresh
        // page load so stale results are never re-extracted.
        self.refresh_page();
        let mut faults = 0u32;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(SessionError::Cancelled);
            }
            match self.step(account) {
                Ok(StepOutcome::Done(results)) => return Ok(results),
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Retry(reason)) => {
                    faults += 1;
                    watch_warn!("Retrying for \"{}\" ({}): {}", account.label, faults, reason);
                    if faults >= self.policy.max_faults {
                        return Err(SessionError::RetriesExhausted {
                            faults,
                            last: reason,
                        });
                    }
                    thread::sleep(self.policy.backoff.saturating_mul(faults));
                }
                Err(StepError::Transient(err)) => {
                    faults += 1;
                    watch_warn!(
                        "Portal fault for \"{}\" ({}): {}. Reloading.",
                        account.label,
                        faults,
                        err
                    );
                    if faults >= self.policy.max_faults {
                        return Err(SessionError::RetriesExhausted {
                            faults,
                            last: err.to_string(),
                        });
                    }
                    self.refresh_page();
                    thread::sleep(self.policy.backoff.saturating_mul(faults));
                }
                Err(StepError::Fatal(err)) => return Err(err),
            }
        }
    }

    /// One classify-act iteration.
    fn step(&mut self, account: &Account) -> Result<StepOutcome, StepError> {
        let state = {
            let page = self.ensure_page()?;
            let probe = page.probe()?;
            classify(&probe)
        };
        watch_debug!("Page state for \"{}\": {:?}", account.label, state);

        match action_for(state) {
            SessionAction::RecreateSession => {
                // Dropping the page tears the connection down; the next
                // step reconnects from scratch.
                self.page = None;
                Ok(StepOutcome::Retry("anti-automation challenge".to_string()))
            }
            SessionAction::PerformLogin => self.perform_login(account),
            SessionAction::DismissConsent => {
                let page = self.page_mut()?;
                page.click(Control::ConsentAccept)?;
                Ok(StepOutcome::Continue)
            }
            SessionAction::NavigateToResults => {
                let page = self.page_mut()?;
                page.click(Control::MenuGrades)?;
                page.click(Control::MenuExamResults)?;
                page.click(Control::MenuShowAll)?;
                Ok(StepOutcome::Continue)
            }
            SessionAction::ExtractResults => {
                let page = self.page_mut()?;
                let html = page.results_table_html()?;
                let results = extract_results(&html)
                    .map_err(|err| StepError::Fatal(SessionError::Extract(err)))?;
                watch_info!(
                    "Extracted {} lectures for \"{}\".",
                    results.len(),
                    account.label
                );
                Ok(StepOutcome::Done(results))
            }
            SessionAction::Reload => {
                let page = self.page_mut()?;
                page.reload()?;
                Ok(StepOutcome::Retry("unclassifiable page".to_string()))
            }
        }
    }

    fn perform_login(&mut self, account: &Account) -> Result<StepOutcome, StepError> {
        let oracle = self.oracle.clone();
        let page = self.page_mut()?;
        page.fill(Field::Username, &account.username)?;
        page.fill(Field::Password, &account.password)?;

        let image = page.captcha_image()?;
        match oracle.recognize(&image) {
            Some(answer) => {
                page.fill(Field::Captcha, &answer.to_string())?;
                page.click(Control::Login)?;
                Ok(StepOutcome::Continue)
            }
            None => {
                // Never submit the failure sentinel; get a fresh challenge.
                page.reload()?;
                Ok(StepOutcome::Retry("captcha unrecognized".to_string()))
            }
        }
    }

    fn ensure_page(&mut self) -> Result<&mut dyn PortalPage, StepError> {
        if self.page.is_none() {
            watch_info!("Opening a fresh portal session.");
            self.page = Some(self.connector.connect()?);
        }
        self.page_mut()
    }

    fn page_mut(&mut self) -> Result<&mut dyn PortalPage, StepError> {
        match self.page.as_deref_mut() {
            Some(page) => Ok(page),
            None => Err(StepError::Transient(PortalError::new(
                crate::port::PortalFaultKind::ConnectionLost,
                "session not connected",
            ))),
        }
    }

    /// Reloads the live page if there is one; a page that cannot even
    /// reload is dropped so the next step reconnects.
    fn refresh_page(&mut self) {
        if let Some(page) = self.page.as_deref_mut() {
            if page.reload().is_err() {
                self.page = None;
            }
        }
    }
}
