//! Page functions that read application state the DOM alone cannot answer.

use crate::driver::PageFunction;

/// Name of [`last_message_id`]
pub const LAST_MESSAGE_ID: &str = "last_message_id";
/// Name of [`fully_processed_message`]
pub const FULLY_PROCESSED_MESSAGE: &str = "fully_processed_message";
/// Name of [`rendered_messages`]
pub const RENDERED_MESSAGES: &str = "rendered_messages";

const LAST_MESSAGE_ID_JS: &str = r#"(table) => {
    const rows = document.querySelectorAll(`#${CSS.escape(table)} .message_row`);
    if (rows.length === 0) {
        return null;
    }
    const zid = rows[rows.length - 1].getAttribute("zid");
    return zid === null ? null : Number(zid);
}"#;

// A sent message is echoed locally first, with a temporary id and without
// the controls that need a server id. It counts as processed once the
// client has the server copy and the last visible row has been re-rendered
// from it (the star control only exists on acknowledged rows).
const FULLY_PROCESSED_MESSAGE_JS: &str = r#"(content) => {
    const last_msg = zulip_test.current_msg_list.last();
    if (last_msg === undefined || last_msg.raw_content !== content) {
        return null;
    }
    if (last_msg.locally_echoed) {
        return null;
    }
    const $row = zulip_test.last_visible_row();
    if (zulip_test.row_id($row) !== last_msg.id) {
        return null;
    }
    return $row.find(".star").length === 1 ? last_msg.id : null;
}"#;

const RENDERED_MESSAGES_JS: &str = r#"(table) => {
    const $recipient_rows = $(`#${CSS.escape(table)}`).find(".recipient_row");
    return $recipient_rows.toArray().map((element) => {
        const $el = $(element);
        const stream_name = $el.find(".stream_label").text().trim();
        const topic_name = $el.find(".stream_topic a").text().trim();
        const header = topic_name === "" ? stream_name : `${stream_name} > ${topic_name}`;
        const bodies = $el
            .find(".message_row .message_content")
            .toArray()
            .map((body) => $(body).text().trim());
        return [header, bodies];
    });
}"#;

/// Id of the last message row in `table`, or `null`
#[must_use]
pub fn last_message_id(table: &str) -> PageFunction {
    PageFunction::new(LAST_MESSAGE_ID, LAST_MESSAGE_ID_JS).arg(table)
}

/// Id of the last message once it carries `content` and is acknowledged
/// by the server, else `null`
#[must_use]
pub fn fully_processed_message(content: &str) -> PageFunction {
    PageFunction::new(FULLY_PROCESSED_MESSAGE, FULLY_PROCESSED_MESSAGE_JS).arg(content)
}

/// `[[header, [bodies...]], ...]` for every recipient block of `table`
#[must_use]
pub fn rendered_messages(table: &str) -> PageFunction {
    PageFunction::new(RENDERED_MESSAGES, RENDERED_MESSAGES_JS).arg(table)
}
