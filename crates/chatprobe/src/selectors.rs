//! CSS selectors of the chat web UI.

use crate::message::MessageId;

/// Login form
pub const LOGIN_FORM: &str = "#login_form";
/// Login email input
pub const LOGIN_USERNAME: &str = "#id_username";
/// Login password input
pub const LOGIN_PASSWORD: &str = "#id_password";
/// Login submit button
pub const LOGIN_SUBMIT: &str = "#login_form button[type=\"submit\"]";
/// Present once the home view has rendered after login
pub const LOGGED_IN_MARKER: &str = "#recent_topics_filter_buttons";

/// Left sidebar "All messages" entry
pub const ALL_MESSAGES: &str = ".top_left_all_messages";

/// Opens the compose box for a stream message
pub const COMPOSE_STREAM_BUTTON: &str = "#left_bar_compose_stream_button_big";
/// Opens the compose box for a private message
pub const COMPOSE_PRIVATE_BUTTON: &str = "#left_bar_compose_private_button_big";
/// Stream input of the compose box
pub const COMPOSE_STREAM: &str = "#stream_message_recipient_stream";
/// Topic input of the compose box
pub const COMPOSE_TOPIC: &str = "#stream_message_recipient_topic";
/// Private recipient input of the compose box
pub const COMPOSE_PRIVATE_RECIPIENT: &str = "#private_message_recipient";
/// Highlighted recipient suggestion
pub const TYPEAHEAD_ACTIVE: &str = ".typeahead-menu .active a";
/// Message body textarea
pub const COMPOSE_TEXTAREA: &str = "#compose-textarea";
/// Send button
pub const COMPOSE_SEND: &str = "#compose-send-button";
/// Closes the compose box
pub const COMPOSE_CLOSE: &str = "#compose_close";

/// "Edit message" entry of the message actions popover
pub const POPOVER_EDIT_MESSAGE: &str = ".popover_edit_message";

/// Hover-revealed actions control of a message row
pub const ROW_ACTIONS: &str = ".message_control_button.actions_hover";
/// Topic input of the inline edit form
pub const ROW_EDIT_TOPIC: &str = ".message_edit_topic";
/// Content textarea of the inline edit form
pub const ROW_EDIT_CONTENT: &str = ".message_edit_content";
/// Save button of the inline edit form
pub const ROW_EDIT_SAVE: &str = ".message_edit_save";
/// Status text of a `/me` message
pub const ROW_STATUS_MESSAGE: &str = ".status-message";
/// Sender name of a `/me` message
pub const ROW_STATUS_SENDER: &str = ".sender_name-in-status";

/// The message table with the given DOM id
#[must_use]
pub fn table(table: &str) -> String {
    format!("#{table}")
}

/// Any message row of a table
#[must_use]
pub fn message_rows(table: &str) -> String {
    format!("#{table} .message_row")
}

/// The row of one message
#[must_use]
pub fn message_row(table: &str, id: MessageId) -> String {
    format!("#{table} .message_row[zid=\"{id}\"]")
}

/// An element inside the row of one message
#[must_use]
pub fn in_row(table: &str, id: MessageId, inner: &str) -> String {
    format!("{} {inner}", message_row(table, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_selectors() {
        assert_eq!(message_rows("zhome"), "#zhome .message_row");
        assert_eq!(
            message_row("zhome", MessageId(42)),
            "#zhome .message_row[zid=\"42\"]"
        );
        assert_eq!(
            in_row("zhome", MessageId(42), ROW_EDIT_CONTENT),
            "#zhome .message_row[zid=\"42\"] .message_edit_content"
        );
    }
}
