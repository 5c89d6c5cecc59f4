//! Shared UI helpers: login, compose, message processing and rendered
//! message checks.

use crate::driver::PageDriver;
use crate::message::{Destination, MessageDraft, MessageGroup, MessageId};
use crate::result::{ProbeError, ProbeResult};
use crate::scripts;
use crate::selectors;
use crate::session::Session;
use crate::wait::Visibility;
use tracing::{debug, info};

/// Log the fixture user in through the login form.
///
/// Lands on the home view; fails with a navigation error if the login page
/// redirects elsewhere, and with a timeout on the logged-in marker if the
/// credentials are refused.
pub async fn log_in<D: PageDriver>(session: &Session<D>) -> ProbeResult<()> {
    let login_url = session.config().login_url();
    let user = &session.fixtures().user;
    let driver = session.driver();

    driver.goto(&login_url).await?;
    let landed = driver.current_url().await?;
    if landed != login_url {
        return Err(ProbeError::Navigation {
            url: login_url,
            message: format!("landed on {landed}"),
        });
    }

    session
        .wait_for_selector(selectors::LOGIN_FORM, Visibility::Visible)
        .await?;
    clear_and_type(session, selectors::LOGIN_USERNAME, &user.email).await?;
    clear_and_type(session, selectors::LOGIN_PASSWORD, &user.password).await?;
    driver.click(selectors::LOGIN_SUBMIT).await?;

    session
        .wait_for_selector(selectors::LOGGED_IN_MARKER, Visibility::Visible)
        .await?;
    info!(email = %user.email, "logged in");
    Ok(())
}

/// Replace the value of an input.
pub async fn clear_and_type<D: PageDriver>(
    session: &Session<D>,
    selector: &str,
    text: &str,
) -> ProbeResult<()> {
    let driver = session.driver();
    driver.clear(selector).await?;
    driver.type_text(selector, text).await
}

/// Send a message through the compose box and return its server id.
///
/// The compose box must start empty. Returns once the message is fully
/// processed and the compose box is closed again.
pub async fn send_message<D: PageDriver>(
    session: &Session<D>,
    draft: &MessageDraft,
) -> ProbeResult<MessageId> {
    let driver = session.driver();

    session
        .wait_for_selector(selectors::COMPOSE_TEXTAREA, Visibility::Attached)
        .await?;
    let pending = driver
        .input_value(selectors::COMPOSE_TEXTAREA)
        .await?
        .unwrap_or_default();
    if !pending.is_empty() {
        return Err(ProbeError::assertion(format!(
            "compose box is not empty: {pending:?}"
        )));
    }

    match &draft.destination {
        Destination::Stream { stream, topic } => {
            driver.click(selectors::COMPOSE_STREAM_BUTTON).await?;
            session
                .wait_for_selector(selectors::COMPOSE_STREAM, Visibility::Visible)
                .await?;
            clear_and_type(session, selectors::COMPOSE_STREAM, stream).await?;
            clear_and_type(session, selectors::COMPOSE_TOPIC, topic).await?;
        }
        Destination::Private { recipients } => {
            driver.click(selectors::COMPOSE_PRIVATE_BUTTON).await?;
            session
                .wait_for_selector(selectors::COMPOSE_PRIVATE_RECIPIENT, Visibility::Visible)
                .await?;
            for recipient in recipients {
                driver
                    .type_text(selectors::COMPOSE_PRIVATE_RECIPIENT, recipient)
                    .await?;
                session
                    .wait_for_selector(selectors::TYPEAHEAD_ACTIVE, Visibility::Visible)
                    .await?;
                driver
                    .press_key(selectors::COMPOSE_PRIVATE_RECIPIENT, "Enter")
                    .await?;
            }
        }
    }

    clear_and_type(session, selectors::COMPOSE_TEXTAREA, &draft.content).await?;
    session
        .wait_for_input_value(selectors::COMPOSE_TEXTAREA, &draft.content)
        .await?;

    session
        .wait_for_selector(selectors::COMPOSE_SEND, Visibility::Visible)
        .await?;
    driver.click(selectors::COMPOSE_SEND).await?;
    session
        .wait_for_input_value(selectors::COMPOSE_TEXTAREA, "")
        .await?;

    let id = wait_for_fully_processed_message(session, &draft.content).await?;

    driver.trigger_click(selectors::COMPOSE_CLOSE).await?;
    session
        .wait_for_selector(selectors::COMPOSE_TEXTAREA, Visibility::Hidden)
        .await?;

    info!(%id, content = %draft.content, "message sent");
    Ok(id)
}

/// Wait until the last message carries `content` and has been
/// acknowledged by the server, returning its id.
pub async fn wait_for_fully_processed_message<D: PageDriver>(
    session: &Session<D>,
    content: &str,
) -> ProbeResult<MessageId> {
    let driver = session.driver();
    let waited_for = format!("message {content:?} to be fully processed");
    let result = session
        .wait_for(&waited_for, || async move {
            let value = driver
                .call_function(&scripts::fully_processed_message(content))
                .await?;
            Ok(value.as_u64().map(MessageId))
        })
        .await?;
    debug!(id = %result.value, polls = result.polls, "message fully processed");
    Ok(result.value)
}

/// Id of the last message row of `table`
pub async fn last_message_id<D: PageDriver>(
    session: &Session<D>,
    table: &str,
) -> ProbeResult<MessageId> {
    let value = session
        .driver()
        .call_function(&scripts::last_message_id(table))
        .await?;
    value
        .as_u64()
        .map(MessageId)
        .ok_or_else(|| ProbeError::not_found(selectors::message_rows(table)))
}

/// Recipient groups currently rendered in `table`, top to bottom.
pub async fn get_rendered_messages<D: PageDriver>(
    session: &Session<D>,
    table: &str,
) -> ProbeResult<Vec<MessageGroup>> {
    let value = session
        .driver()
        .call_function(&scripts::rendered_messages(table))
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// Check that the last groups rendered in `table` are `expected`.
pub async fn check_messages_sent<D: PageDriver>(
    session: &Session<D>,
    table: &str,
    expected: &[MessageGroup],
) -> ProbeResult<()> {
    session
        .wait_for_selector(&selectors::table(table), Visibility::Visible)
        .await?;
    let rendered = get_rendered_messages(session, table).await?;
    let tail = &rendered[rendered.len().saturating_sub(expected.len())..];
    if tail != expected {
        return Err(ProbeError::MessageMismatch {
            view: table.to_string(),
            expected: expected.to_vec(),
            actual: tail.to_vec(),
        });
    }
    Ok(())
}

/// Wait until the text of `selector` equals `expected`.
pub async fn wait_for_text<D: PageDriver>(
    session: &Session<D>,
    selector: &str,
    expected: &str,
    trim: bool,
) -> ProbeResult<()> {
    session.wait_for_text(selector, expected, trim).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SuiteConfig;
    use crate::fake::{FakeChat, FakeFault, HOME_TABLE};
    use crate::wait::WaitOptions;

    fn session_with(fake: FakeChat) -> Session<FakeChat> {
        let config = SuiteConfig::default()
            .with_wait(WaitOptions::new().with_timeout(200).with_poll_interval(2));
        Session::new(fake, config)
    }

    async fn ready(fake: FakeChat) -> Session<FakeChat> {
        let session = session_with(fake);
        log_in(&session).await.unwrap();
        session.driver().click(selectors::ALL_MESSAGES).await.unwrap();
        session
    }

    mod login_tests {
        use super::*;

        #[tokio::test]
        async fn test_log_in() {
            let session = session_with(FakeChat::new());
            log_in(&session).await.unwrap();
            assert_eq!(
                session.driver().logged_in_user().as_deref(),
                Some("desdemona@zulip.com")
            );
        }

        #[tokio::test]
        async fn test_rejected_login_times_out_on_marker() {
            let session = session_with(FakeChat::new().with_fault(FakeFault::RejectLogin));
            let err = log_in(&session).await.unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { .. }));
            assert!(err.to_string().contains(selectors::LOGGED_IN_MARKER));
        }

        #[tokio::test]
        async fn test_wrong_password_from_config() {
            let mut config = SuiteConfig::default()
                .with_wait(WaitOptions::new().with_timeout(50).with_poll_interval(2));
            config.fixtures.user.password = "nope".into();
            let session = Session::new(FakeChat::new(), config);
            assert!(log_in(&session).await.is_err());
        }
    }

    mod send_tests {
        use super::*;

        #[tokio::test]
        async fn test_send_stream_message_returns_new_id() {
            let session = ready(FakeChat::new()).await;
            let id = send_message(&session, &MessageDraft::stream("Verona", "edits", "hi"))
                .await
                .unwrap();

            let stored = session.driver().message(id).unwrap();
            assert_eq!(stored.content, "hi");
            assert!(stored.acked);
            assert_eq!(last_message_id(&session, HOME_TABLE).await.unwrap(), id);
            assert!(!session
                .driver()
                .is_visible(selectors::COMPOSE_TEXTAREA)
                .await
                .unwrap());
        }

        #[tokio::test]
        async fn test_send_private_message() {
            let session = ready(FakeChat::new()).await;
            send_message(
                &session,
                &MessageDraft::private("cordelia@zulip.com", "psst"),
            )
            .await
            .unwrap();
            check_messages_sent(
                &session,
                HOME_TABLE,
                &[MessageGroup::new("You and Cordelia, Lear's daughter", ["psst"])],
            )
            .await
            .unwrap();
        }

        #[tokio::test]
        async fn test_send_before_login_times_out_on_compose_box() {
            let session = session_with(FakeChat::new());
            let err = send_message(&session, &MessageDraft::stream("Verona", "edits", "x"))
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { .. }));
            assert!(err.to_string().contains(selectors::COMPOSE_TEXTAREA));
        }

        #[tokio::test]
        async fn test_unknown_recipient_times_out_on_typeahead() {
            let session = ready(FakeChat::new()).await;
            let err = send_message(&session, &MessageDraft::private("nobody@zulip.com", "x"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains(selectors::TYPEAHEAD_ACTIVE));
        }
    }

    mod rendered_tests {
        use super::*;

        #[tokio::test]
        async fn test_check_messages_sent_mismatch_shows_both_sides() {
            let session = ready(FakeChat::new()).await;
            let expected = [MessageGroup::new("Verona > test", ["something else"])];
            let err = check_messages_sent(&session, HOME_TABLE, &expected)
                .await
                .unwrap_err();
            match &err {
                ProbeError::MessageMismatch {
                    view,
                    expected,
                    actual,
                } => {
                    assert_eq!(view, HOME_TABLE);
                    assert_eq!(expected.len(), 1);
                    assert_eq!(actual[0].bodies, ["verona test a", "verona test b"]);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_check_compares_only_the_tail() {
            let session = ready(
                FakeChat::new().with_message(
                    "hamlet@zulip.com",
                    Destination::stream("Denmark", "castle"),
                    "ghost",
                ),
            )
            .await;
            check_messages_sent(
                &session,
                HOME_TABLE,
                &[MessageGroup::new("Denmark > castle", ["ghost"])],
            )
            .await
            .unwrap();
        }

        #[tokio::test]
        async fn test_last_message_id_of_empty_table() {
            let session = ready(FakeChat::empty()).await;
            let err = last_message_id(&session, HOME_TABLE).await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
        }
    }
}
