use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::advisor::{Advisor, SuggestionDraft};
use crate::error::{CoreError, CoreResult};
use crate::models::{UserProfile, Workout};
use crate::policy;
use crate::session::Session;

pub const DEFAULT_REVIEW_TIMEOUT: Duration = Duration::from_secs(20);

/// Ask the advisor, bounded by `timeout`. Every failure mode collapses into
/// `SuggestionUnavailable`.
async fn ask(
    advisor: Option<&dyn Advisor>,
    workout: &Workout,
    profile: Option<&UserProfile>,
    timeout: Duration,
) -> CoreResult<Vec<SuggestionDraft>> {
    let Some(advisor) = advisor else {
        return Err(CoreError::SuggestionUnavailable("no advisor configured".into()));
    };

    match tokio::time::timeout(timeout, advisor.suggest(workout, profile)).await {
        Ok(Ok(drafts)) => Ok(drafts),
        Ok(Err(e)) => Err(CoreError::SuggestionUnavailable(format!("{e:#}"))),
        Err(_) => Err(CoreError::SuggestionUnavailable(format!(
            "advisor timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

/// Move a running session into review with a complete suggestion set.
///
/// Only misuse of the state machine is returned as an error. If this future
/// is dropped while the advisor is pending, the session stays in
/// `AwaitingReview` until [`Session::cancel_review`] is called.
#[instrument(skip_all, fields(workout = %session.workout().name))]
pub async fn request_review(
    session: &mut Session,
    advisor: Option<&dyn Advisor>,
    profile: Option<&UserProfile>,
    timeout: Duration,
) -> CoreResult<()> {
    let request = session.begin_review()?;

    let drafts = match ask(advisor, &request.workout, profile, timeout).await {
        Ok(drafts) => drafts,
        Err(e) => {
            warn!(error = %e, "using fallback suggestions");
            Vec::new()
        }
    };

    let suggestions = policy::reconcile(&request.workout, profile, &drafts);
    info!(count = suggestions.len(), "review ready");
    session.complete_review(request.ticket, suggestions)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, Origin};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    struct Broken;

    #[async_trait]
    impl Advisor for Broken {
        async fn suggest(&self, _: &Workout, _: Option<&UserProfile>) -> Result<Vec<SuggestionDraft>> {
            Err(anyhow!("connection refused"))
        }
    }

    struct Slow;

    #[async_trait]
    impl Advisor for Slow {
        async fn suggest(&self, _: &Workout, _: Option<&UserProfile>) -> Result<Vec<SuggestionDraft>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    fn running() -> Session {
        let mut s = Session::new(Workout::new(
            "Day A",
            vec![Exercise::new(1, "Bench Press", 3, 10, 40.0)],
        ));
        s.start().unwrap();
        s
    }

    #[tokio::test]
    async fn broken_advisor_still_reaches_review() {
        let mut s = running();
        request_review(&mut s, Some(&Broken as &dyn Advisor), None, DEFAULT_REVIEW_TIMEOUT)
            .await
            .unwrap();

        let sugs = s.suggestions().unwrap();
        assert_eq!(sugs.len(), 1);
        assert_eq!(sugs[0].origin, Origin::Fallback);
        assert!(sugs[0].suggested_weight <= 40.0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_advisor_times_out_into_fallback() {
        let mut s = running();
        request_review(&mut s, Some(&Slow as &dyn Advisor), None, Duration::from_secs(20))
            .await
            .unwrap();
        assert_eq!(s.suggestions().unwrap()[0].origin, Origin::Fallback);
    }

    #[tokio::test]
    async fn no_advisor_uses_fallback() {
        let mut s = running();
        request_review(&mut s, None, None, DEFAULT_REVIEW_TIMEOUT)
            .await
            .unwrap();
        assert!(s.suggestions().is_some());
    }

    #[tokio::test]
    async fn review_from_idle_is_a_state_error() {
        let mut s = Session::new(Workout::new("Day A", vec![]));
        let err = request_review(&mut s, None, None, DEFAULT_REVIEW_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }
}
