//! Message editing.
//!
//! Sends a stream message, a `/me` message and a private message, edits
//! each through the inline editor and checks how the edited message is
//! rendered. The scenarios run in order on one session and each leaves
//! the message it edited as the last row of the message table.

use crate::common::{
    check_messages_sent, clear_and_type, last_message_id, log_in, send_message,
    wait_for_fully_processed_message, wait_for_text,
};
use crate::driver::PageDriver;
use crate::message::{MessageDraft, MessageEdit, MessageGroup, MessageId};
use crate::result::{ProbeError, ProbeResult};
use crate::selectors;
use crate::session::Session;
use crate::wait::Visibility;
use tracing::{info, instrument};

/// Suite name
pub const SUITE_NAME: &str = "edit_tests";

/// Scenario names in execution order
pub const SCENARIOS: &[&str] = &[
    "test_stream_message_edit",
    "test_edit_message_with_slash_me",
    "test_edit_private_message",
];

/// Open the inline editor of message `id`.
///
/// The actions control only shows on hover, so it gets a synthetic click.
#[instrument(skip(session))]
pub async fn trigger_edit_message<D: PageDriver>(
    session: &Session<D>,
    id: MessageId,
) -> ProbeResult<()> {
    let table = &session.fixtures().message_table;
    let driver = session.driver();

    driver
        .trigger_click(&selectors::in_row(table, id, selectors::ROW_ACTIONS))
        .await?;
    session
        .wait_for_selector(selectors::POPOVER_EDIT_MESSAGE, Visibility::Visible)
        .await?;
    driver.click(selectors::POPOVER_EDIT_MESSAGE).await?;
    session
        .wait_for_selector(
            &selectors::in_row(table, id, selectors::ROW_EDIT_CONTENT),
            Visibility::Visible,
        )
        .await
}

/// Open the inline editor of the last message row and return its id
pub async fn trigger_edit_last_message<D: PageDriver>(
    session: &Session<D>,
) -> ProbeResult<MessageId> {
    let id = last_message_id(session, &session.fixtures().message_table).await?;
    trigger_edit_message(session, id).await?;
    Ok(id)
}

/// Apply `edit` to message `id` and wait until the server has it.
#[instrument(skip(session, edit), fields(topic = ?edit.topic))]
pub async fn edit_message<D: PageDriver>(
    session: &Session<D>,
    id: MessageId,
    edit: &MessageEdit,
) -> ProbeResult<()> {
    let table = &session.fixtures().message_table;

    trigger_edit_message(session, id).await?;
    if let Some(topic) = &edit.topic {
        clear_and_type(
            session,
            &selectors::in_row(table, id, selectors::ROW_EDIT_TOPIC),
            topic,
        )
        .await?;
    }
    clear_and_type(
        session,
        &selectors::in_row(table, id, selectors::ROW_EDIT_CONTENT),
        &edit.content,
    )
    .await?;
    session
        .driver()
        .click(&selectors::in_row(table, id, selectors::ROW_EDIT_SAVE))
        .await?;

    let processed = wait_for_fully_processed_message(session, &edit.content).await?;
    if processed != id {
        return Err(ProbeError::assertion(format!(
            "edited message {id}, but message {processed} was processed last"
        )));
    }
    info!(%id, "message edited");
    Ok(())
}

/// Move stream message `id` to `topic` and replace its content
pub async fn edit_stream_message<D: PageDriver>(
    session: &Session<D>,
    id: MessageId,
    topic: &str,
    content: &str,
) -> ProbeResult<()> {
    edit_message(session, id, &MessageEdit::topic_and_content(topic, content)).await
}

/// Replace the content of private message `id`
pub async fn edit_private_message<D: PageDriver>(
    session: &Session<D>,
    id: MessageId,
    content: &str,
) -> ProbeResult<()> {
    edit_message(session, id, &MessageEdit::content(content)).await
}

#[instrument(skip_all)]
pub async fn test_stream_message_edit<D: PageDriver>(session: &Session<D>) -> ProbeResult<()> {
    let fixtures = session.fixtures();
    let id = send_message(
        session,
        &MessageDraft::stream(&fixtures.stream, &fixtures.topic, "test editing"),
    )
    .await?;

    edit_stream_message(session, id, &fixtures.edited_topic, "test edited").await?;

    check_messages_sent(
        session,
        &fixtures.message_table,
        &[MessageGroup::new(
            MessageGroup::stream_header(&fixtures.stream, &fixtures.edited_topic),
            ["test edited"],
        )],
    )
    .await
}

#[instrument(skip_all)]
pub async fn test_edit_message_with_slash_me<D: PageDriver>(
    session: &Session<D>,
) -> ProbeResult<()> {
    let fixtures = session.fixtures();
    let table = &fixtures.message_table;
    let sender = &fixtures.user.full_name;

    let id = send_message(
        session,
        &MessageDraft::stream(
            &fixtures.stream,
            &fixtures.topic,
            "/me test editing a message with me",
        ),
    )
    .await?;
    let status = selectors::in_row(table, id, selectors::ROW_STATUS_MESSAGE);
    let status_sender = selectors::in_row(table, id, selectors::ROW_STATUS_SENDER);

    wait_for_text(session, &status, "test editing a message with me", false).await?;
    wait_for_text(session, &status_sender, sender, true).await?;

    edit_stream_message(
        session,
        id,
        &fixtures.edited_topic,
        "/me test edited a message with me",
    )
    .await?;

    wait_for_text(session, &status, "test edited a message with me", false).await?;
    wait_for_text(session, &status_sender, sender, true).await
}

#[instrument(skip_all)]
pub async fn test_edit_private_message<D: PageDriver>(session: &Session<D>) -> ProbeResult<()> {
    let fixtures = session.fixtures();
    let id = send_message(
        session,
        &MessageDraft::private(&fixtures.recipient.email, "test editing pm"),
    )
    .await?;

    edit_private_message(session, id, "test edited pm").await?;

    check_messages_sent(
        session,
        &fixtures.message_table,
        &[MessageGroup::new(
            MessageGroup::private_header(&[fixtures.recipient.full_name.as_str()]),
            ["test edited pm"],
        )],
    )
    .await
}

/// Log in, open "All messages" and run every edit scenario in order.
///
/// Stops at the first failing step.
#[instrument(skip_all)]
pub async fn edit_tests<D: PageDriver>(session: &Session<D>) -> ProbeResult<()> {
    log_in(session).await?;
    session.driver().click(selectors::ALL_MESSAGES).await?;
    session
        .wait_for_selector(
            &selectors::message_rows(&session.fixtures().message_table),
            Visibility::Visible,
        )
        .await?;

    test_stream_message_edit(session).await?;
    test_edit_message_with_slash_me(session).await?;
    test_edit_private_message(session).await?;
    info!("edit tests passed");
    Ok(())
}
