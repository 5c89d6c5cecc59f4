//! In-memory chat application for testing without a browser.
//!
//! [`FakeChat`] implements [`PageDriver`] over a small model of the chat UI:
//! login form, home view, the "All messages" table, stream and private
//! compose with recipient typeahead, message rows with local echo, the
//! message actions popover, the inline edit form and `/me` rendering.
//!
//! Only the selectors in [`crate::selectors`] are understood. Anything else
//! is reported as not found, like a page without that element would.
//!
//! Sent and edited messages start out locally echoed; the first
//! fully-processed poll acknowledges them, the next one sees them as
//! processed. Faults can be injected with [`FakeFault`].

use crate::driver::{PageDriver, PageFunction};
use crate::message::{Destination, MessageGroup, MessageId};
use crate::result::{ProbeError, ProbeResult};
use crate::scripts;
use crate::selectors as sel;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// DOM id of the only message table the fake renders
pub const HOME_TABLE: &str = "zhome";

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Misbehaviour the fake can be told to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeFault {
    /// The login form never accepts credentials
    RejectLogin,
    /// The actions popover has no "edit message" entry
    NoEditPopover,
    /// Saving an edit closes the form without changing the message
    IgnoreSave,
    /// Edited `/me` messages render as plain messages
    DropMeRendering,
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeUser {
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
    /// Display name
    pub full_name: String,
}

/// A message as stored by the fake server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMessage {
    /// Server id
    pub id: MessageId,
    /// Sender email
    pub sender: String,
    /// Stream/topic or private recipients
    pub destination: Destination,
    /// Raw content as typed
    pub content: String,
    /// Whether the server has acknowledged the latest version
    pub acked: bool,
}

impl FakeMessage {
    fn is_me_message(&self) -> bool {
        self.content.starts_with("/me ")
    }

    /// Text rendered in the row body
    #[must_use]
    pub fn rendered(&self) -> &str {
        self.content.strip_prefix("/me ").unwrap_or(&self.content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Blank,
    Login,
    Home,
    AllMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compose {
    Stream,
    Private,
}

#[derive(Debug, Clone)]
struct EditForm {
    id: MessageId,
    topic: Option<String>,
    content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowPart {
    Row,
    Actions,
    EditTopic,
    EditContent,
    EditSave,
    StatusMessage,
    StatusSender,
    Content,
}

/// What a selector points at
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Static(&'static str),
    Table,
    Rows,
    Row(MessageId, RowPart),
}

const STATIC_SELECTORS: &[&str] = &[
    sel::LOGIN_FORM,
    sel::LOGIN_USERNAME,
    sel::LOGIN_PASSWORD,
    sel::LOGIN_SUBMIT,
    sel::LOGGED_IN_MARKER,
    sel::ALL_MESSAGES,
    sel::COMPOSE_STREAM_BUTTON,
    sel::COMPOSE_PRIVATE_BUTTON,
    sel::COMPOSE_STREAM,
    sel::COMPOSE_TOPIC,
    sel::COMPOSE_PRIVATE_RECIPIENT,
    sel::TYPEAHEAD_ACTIVE,
    sel::COMPOSE_TEXTAREA,
    sel::COMPOSE_SEND,
    sel::COMPOSE_CLOSE,
    sel::POPOVER_EDIT_MESSAGE,
];

fn row_regex() -> Option<&'static Regex> {
    static ROW: OnceLock<Option<Regex>> = OnceLock::new();
    ROW.get_or_init(|| Regex::new(r#"^#([\w-]+) \.message_row\[zid="(\d+)"\](?: (.+))?$"#).ok())
        .as_ref()
}

fn parse_target(selector: &str) -> Option<Target> {
    if let Some(known) = STATIC_SELECTORS.iter().find(|s| **s == selector) {
        return Some(Target::Static(known));
    }
    if selector == sel::table(HOME_TABLE) {
        return Some(Target::Table);
    }
    if selector == sel::message_rows(HOME_TABLE) {
        return Some(Target::Rows);
    }
    let caps = row_regex()?.captures(selector)?;
    if &caps[1] != HOME_TABLE {
        return None;
    }
    let id = MessageId(caps[2].parse().ok()?);
    let part = match caps.get(3).map(|m| m.as_str()) {
        None => RowPart::Row,
        Some(sel::ROW_ACTIONS) => RowPart::Actions,
        Some(sel::ROW_EDIT_TOPIC) => RowPart::EditTopic,
        Some(sel::ROW_EDIT_CONTENT) => RowPart::EditContent,
        Some(sel::ROW_EDIT_SAVE) => RowPart::EditSave,
        Some(sel::ROW_STATUS_MESSAGE) => RowPart::StatusMessage,
        Some(sel::ROW_STATUS_SENDER) => RowPart::StatusSender,
        Some(".message_content") => RowPart::Content,
        Some(_) => return None,
    };
    Some(Target::Row(id, part))
}

#[derive(Debug)]
struct State {
    url: String,
    view: View,
    user: Option<String>,
    users: Vec<FakeUser>,
    fields: HashMap<&'static str, String>,
    compose: Option<Compose>,
    pm_recipients: Vec<String>,
    messages: Vec<FakeMessage>,
    next_id: u64,
    popover_for: Option<MessageId>,
    editing: Option<EditForm>,
    plain_rendered: HashSet<MessageId>,
    faults: HashSet<FakeFault>,
    history: Vec<String>,
    closed: bool,
}

impl State {
    fn logged_in(&self) -> bool {
        self.user.is_some()
    }

    fn user_by_email(&self, email: &str) -> Option<&FakeUser> {
        self.users.iter().find(|u| u.email == email)
    }

    fn full_name(&self, email: &str) -> String {
        self.user_by_email(email)
            .map_or_else(|| email.to_string(), |u| u.full_name.clone())
    }

    fn message(&self, id: MessageId) -> Option<&FakeMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn field(&self, selector: &'static str) -> &str {
        self.fields.get(selector).map_or("", String::as_str)
    }

    fn typeahead_match(&self) -> Option<&FakeUser> {
        let typed = self.field(sel::COMPOSE_PRIVATE_RECIPIENT);
        if typed.is_empty() {
            return None;
        }
        self.users.iter().find(|u| u.email.starts_with(typed))
    }

    fn rows_rendered(&self) -> bool {
        self.view == View::AllMessages
    }

    fn exists(&self, target: &Target) -> bool {
        match target {
            Target::Static(s) => self.static_attached(s),
            Target::Table => self.rows_rendered(),
            Target::Rows => self.rows_rendered() && !self.messages.is_empty(),
            Target::Row(id, part) => {
                let Some(message) = self.message(*id).filter(|_| self.rows_rendered()) else {
                    return false;
                };
                let editing_this = self.editing.as_ref().is_some_and(|f| f.id == *id);
                match part {
                    RowPart::Row | RowPart::Content => true,
                    RowPart::Actions => message.acked,
                    RowPart::EditTopic => editing_this && message.destination.is_stream(),
                    RowPart::EditContent | RowPart::EditSave => editing_this,
                    RowPart::StatusMessage | RowPart::StatusSender => {
                        message.is_me_message() && !self.plain_rendered.contains(id)
                    }
                }
            }
        }
    }

    fn visible(&self, target: &Target) -> bool {
        match target {
            Target::Static(s) => self.static_attached(s) && self.static_visible(s),
            // hover-revealed, never visible without a pointer over the row
            Target::Row(_, RowPart::Actions) => false,
            other => self.exists(other),
        }
    }

    /// Static elements stay in the DOM while their page is loaded, shown or not.
    fn static_attached(&self, selector: &str) -> bool {
        match selector {
            sel::LOGIN_FORM | sel::LOGIN_USERNAME | sel::LOGIN_PASSWORD | sel::LOGIN_SUBMIT => {
                self.view == View::Login
            }
            sel::LOGGED_IN_MARKER
            | sel::COMPOSE_STREAM
            | sel::COMPOSE_TOPIC
            | sel::COMPOSE_PRIVATE_RECIPIENT
            | sel::COMPOSE_TEXTAREA
            | sel::COMPOSE_SEND
            | sel::COMPOSE_CLOSE => {
                self.logged_in() && matches!(self.view, View::Home | View::AllMessages)
            }
            other => self.static_visible(other),
        }
    }

    fn static_visible(&self, selector: &str) -> bool {
        match selector {
            sel::LOGIN_FORM | sel::LOGIN_USERNAME | sel::LOGIN_PASSWORD | sel::LOGIN_SUBMIT => {
                self.view == View::Login
            }
            sel::LOGGED_IN_MARKER => self.view == View::Home,
            sel::ALL_MESSAGES | sel::COMPOSE_STREAM_BUTTON | sel::COMPOSE_PRIVATE_BUTTON => {
                self.logged_in() && matches!(self.view, View::Home | View::AllMessages)
            }
            sel::COMPOSE_STREAM | sel::COMPOSE_TOPIC => self.compose == Some(Compose::Stream),
            sel::COMPOSE_PRIVATE_RECIPIENT => self.compose == Some(Compose::Private),
            sel::TYPEAHEAD_ACTIVE => {
                self.compose == Some(Compose::Private) && self.typeahead_match().is_some()
            }
            sel::COMPOSE_TEXTAREA | sel::COMPOSE_SEND | sel::COMPOSE_CLOSE => {
                self.compose.is_some()
            }
            sel::POPOVER_EDIT_MESSAGE => {
                self.popover_for.is_some() && !self.faults.contains(&FakeFault::NoEditPopover)
            }
            _ => false,
        }
    }

    fn text(&self, target: &Target) -> Option<String> {
        if !self.exists(target) {
            return None;
        }
        match target {
            Target::Row(id, part) => {
                let message = self.message(*id)?;
                match part {
                    RowPart::StatusMessage | RowPart::Content => {
                        Some(message.rendered().to_string())
                    }
                    RowPart::StatusSender => Some(format!("\n  {}\n", self.full_name(&message.sender))),
                    RowPart::EditTopic | RowPart::EditContent => None,
                    RowPart::Row | RowPart::Actions | RowPart::EditSave => Some(String::new()),
                }
            }
            Target::Static(s) if *s == sel::TYPEAHEAD_ACTIVE => {
                self.typeahead_match().map(|u| u.full_name.clone())
            }
            _ => Some(String::new()),
        }
    }

    fn input_value(&self, target: &Target) -> Option<String> {
        if !self.exists(target) {
            return None;
        }
        match target {
            Target::Static(s) => match *s {
                sel::LOGIN_USERNAME
                | sel::LOGIN_PASSWORD
                | sel::COMPOSE_STREAM
                | sel::COMPOSE_TOPIC
                | sel::COMPOSE_PRIVATE_RECIPIENT
                | sel::COMPOSE_TEXTAREA => Some(self.field(*s).to_string()),
                _ => None,
            },
            Target::Row(_, RowPart::EditTopic) => {
                self.editing.as_ref().and_then(|f| f.topic.clone())
            }
            Target::Row(_, RowPart::EditContent) => {
                self.editing.as_ref().map(|f| f.content.clone())
            }
            _ => None,
        }
    }

    fn input_mut(&mut self, target: &Target) -> Option<&mut String> {
        match target {
            Target::Static(s) => match *s {
                sel::LOGIN_USERNAME
                | sel::LOGIN_PASSWORD
                | sel::COMPOSE_STREAM
                | sel::COMPOSE_TOPIC
                | sel::COMPOSE_PRIVATE_RECIPIENT
                | sel::COMPOSE_TEXTAREA => Some(self.fields.entry(*s).or_default()),
                _ => None,
            },
            Target::Row(_, RowPart::EditTopic) => {
                self.editing.as_mut().and_then(|f| f.topic.as_mut())
            }
            Target::Row(_, RowPart::EditContent) => self.editing.as_mut().map(|f| &mut f.content),
            _ => None,
        }
    }

    fn activate(&mut self, target: &Target) {
        match target {
            Target::Static(sel::LOGIN_SUBMIT) => self.submit_login(),
            Target::Static(sel::ALL_MESSAGES) => {
                self.view = View::AllMessages;
                self.popover_for = None;
            }
            Target::Static(sel::COMPOSE_STREAM_BUTTON) => self.compose = Some(Compose::Stream),
            Target::Static(sel::COMPOSE_PRIVATE_BUTTON) => {
                self.compose = Some(Compose::Private);
                self.pm_recipients.clear();
            }
            Target::Static(sel::COMPOSE_SEND) => self.send(),
            Target::Static(sel::COMPOSE_CLOSE) => {
                self.compose = None;
                self.pm_recipients.clear();
                for field in [sel::COMPOSE_STREAM, sel::COMPOSE_TOPIC, sel::COMPOSE_PRIVATE_RECIPIENT] {
                    self.fields.remove(field);
                }
            }
            Target::Static(sel::POPOVER_EDIT_MESSAGE) => self.open_editor(),
            Target::Row(id, RowPart::Actions) => self.popover_for = Some(*id),
            Target::Row(_, RowPart::EditSave) => self.save_edit(),
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        if self.faults.contains(&FakeFault::RejectLogin) {
            return;
        }
        let email = self.field(sel::LOGIN_USERNAME).to_string();
        let password = self.field(sel::LOGIN_PASSWORD);
        let accepted = self
            .user_by_email(&email)
            .is_some_and(|u| u.password == password);
        if accepted {
            self.user = Some(email);
            self.view = View::Home;
            self.fields.remove(sel::LOGIN_PASSWORD);
            if let Some(root) = self.url.strip_suffix("login/") {
                self.url = root.to_string();
            }
        }
    }

    fn send(&mut self) {
        let Some(sender) = self.user.clone() else {
            return;
        };
        let content = self.field(sel::COMPOSE_TEXTAREA).to_string();
        if content.trim().is_empty() {
            return;
        }
        let destination = match self.compose {
            Some(Compose::Stream) => {
                let stream = self.field(sel::COMPOSE_STREAM).to_string();
                let topic = self.field(sel::COMPOSE_TOPIC).to_string();
                if stream.is_empty() || topic.is_empty() {
                    return;
                }
                Destination::Stream { stream, topic }
            }
            Some(Compose::Private) => {
                if self.pm_recipients.is_empty() {
                    return;
                }
                Destination::Private {
                    recipients: self.pm_recipients.clone(),
                }
            }
            None => return,
        };
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(FakeMessage {
            id,
            sender,
            destination,
            content,
            acked: false,
        });
        self.fields.insert(sel::COMPOSE_TEXTAREA, String::new());
    }

    fn open_editor(&mut self) {
        if self.faults.contains(&FakeFault::NoEditPopover) {
            return;
        }
        let Some(id) = self.popover_for.take() else {
            return;
        };
        let Some(message) = self.message(id) else {
            return;
        };
        let topic = match &message.destination {
            Destination::Stream { topic, .. } => Some(topic.clone()),
            Destination::Private { .. } => None,
        };
        self.editing = Some(EditForm {
            id,
            topic,
            content: message.content.clone(),
        });
    }

    fn save_edit(&mut self) {
        let Some(form) = self.editing.take() else {
            return;
        };
        if self.faults.contains(&FakeFault::IgnoreSave) {
            return;
        }
        if self.faults.contains(&FakeFault::DropMeRendering) {
            self.plain_rendered.insert(form.id);
        }
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == form.id) {
            message.content = form.content;
            if let (Some(new_topic), Destination::Stream { topic, .. }) =
                (form.topic, &mut message.destination)
            {
                *topic = new_topic;
            }
            message.acked = false;
        }
    }

    fn press(&mut self, target: &Target, key: &str) {
        if key != "Enter" || *target != Target::Static(sel::COMPOSE_PRIVATE_RECIPIENT) {
            return;
        }
        if let Some(email) = self.typeahead_match().map(|u| u.email.clone()) {
            if !self.pm_recipients.contains(&email) {
                self.pm_recipients.push(email);
            }
            self.fields.insert(sel::COMPOSE_PRIVATE_RECIPIENT, String::new());
        }
    }

    fn last_message_id(&self, table: &str) -> Value {
        if table != HOME_TABLE || !self.rows_rendered() {
            return Value::Null;
        }
        self.messages.last().map_or(Value::Null, |m| json!(m.id.0))
    }

    fn fully_processed(&mut self, content: &str) -> Value {
        let Some(last) = self.messages.last_mut() else {
            return Value::Null;
        };
        if last.content != content {
            return Value::Null;
        }
        if !last.acked {
            last.acked = true;
            return Value::Null;
        }
        json!(last.id.0)
    }

    fn rendered_messages(&self, table: &str) -> Value {
        if table != HOME_TABLE || !self.rows_rendered() {
            return json!([]);
        }
        let viewer = self.user.clone().unwrap_or_default();
        let groups = group_messages(&self.messages, &viewer, |email| self.full_name(email));
        serde_json::to_value(groups).unwrap_or_else(|_| json!([]))
    }
}

/// Group consecutive messages under their recipient header, as the
/// message table renders them for `viewer`.
pub fn group_messages<F>(messages: &[FakeMessage], viewer: &str, full_name: F) -> Vec<MessageGroup>
where
    F: Fn(&str) -> String,
{
    let mut groups: Vec<MessageGroup> = Vec::new();
    for message in messages {
        let header = match &message.destination {
            Destination::Stream { stream, topic } => MessageGroup::stream_header(stream, topic),
            Destination::Private { recipients } => {
                let mut others: Vec<String> = recipients
                    .iter()
                    .chain(std::iter::once(&message.sender))
                    .filter(|email| email.as_str() != viewer)
                    .map(|email| full_name(email))
                    .collect();
                others.sort();
                others.dedup();
                // a conversation with yourself is headed by your own name
                if others.is_empty() {
                    others.push(full_name(viewer));
                }
                let names: Vec<&str> = others.iter().map(String::as_str).collect();
                MessageGroup::private_header(&names)
            }
        };
        let body = message.rendered().to_string();
        match groups.last_mut() {
            Some(group) if group.header == header => group.bodies.push(body),
            _ => groups.push(MessageGroup::new(header, [body])),
        }
    }
    groups
}

/// In-memory chat application driven like a browser page
#[derive(Debug)]
pub struct FakeChat {
    state: Mutex<State>,
}

impl Default for FakeChat {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeChat {
    /// Development-server users plus a couple of existing stream messages
    #[must_use]
    pub fn new() -> Self {
        Self::empty()
            .with_message(
                "hamlet@zulip.com",
                Destination::stream("Verona", "test"),
                "verona test a",
            )
            .with_message(
                "othello@zulip.com",
                Destination::stream("Verona", "test"),
                "verona test b",
            )
    }

    /// Development-server users, no messages
    #[must_use]
    pub fn empty() -> Self {
        let users = [
            ("desdemona@zulip.com", "Desdemona"),
            ("cordelia@zulip.com", "Cordelia, Lear's daughter"),
            ("hamlet@zulip.com", "King Hamlet"),
            ("othello@zulip.com", "Othello, the Moor of Venice"),
        ]
        .into_iter()
        .map(|(email, full_name)| FakeUser {
            email: email.to_string(),
            password: "password".to_string(),
            full_name: full_name.to_string(),
        })
        .collect();

        Self {
            state: Mutex::new(State {
                url: String::from("about:blank"),
                view: View::Blank,
                user: None,
                users,
                fields: HashMap::new(),
                compose: None,
                pm_recipients: Vec::new(),
                messages: Vec::new(),
                next_id: 1,
                popover_for: None,
                editing: None,
                plain_rendered: HashSet::new(),
                faults: HashSet::new(),
                history: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Register another account
    #[must_use]
    pub fn with_user(self, user: FakeUser) -> Self {
        self.lock().users.push(user);
        self
    }

    /// Add an already acknowledged message
    #[must_use]
    pub fn with_message(self, sender: &str, destination: Destination, content: &str) -> Self {
        {
            let mut state = self.lock();
            let id = MessageId(state.next_id);
            state.next_id += 1;
            state.messages.push(FakeMessage {
                id,
                sender: sender.to_string(),
                destination,
                content: content.to_string(),
                acked: true,
            });
        }
        self
    }

    /// Inject a fault
    #[must_use]
    pub fn with_fault(self, fault: FakeFault) -> Self {
        self.lock().faults.insert(fault);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.lock().history.push(call);
    }

    /// Snapshot of all stored messages
    #[must_use]
    pub fn messages(&self) -> Vec<FakeMessage> {
        self.lock().messages.clone()
    }

    /// One stored message
    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<FakeMessage> {
        self.lock().message(id).cloned()
    }

    /// Email of the logged-in user
    #[must_use]
    pub fn logged_in_user(&self) -> Option<String> {
        self.lock().user.clone()
    }

    /// Check if a recorded `"<method>:<selector>"` call starts with `call`
    #[must_use]
    pub fn was_called(&self, call: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(call))
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn target(selector: &str) -> ProbeResult<Target> {
        parse_target(selector).ok_or_else(|| ProbeError::not_found(selector))
    }

    fn existing(&self, selector: &str) -> ProbeResult<Target> {
        let target = Self::target(selector)?;
        if self.lock().exists(&target) {
            Ok(target)
        } else {
            Err(ProbeError::not_found(selector))
        }
    }

    fn interactable(&self, selector: &str) -> ProbeResult<Target> {
        let target = self.existing(selector)?;
        if self.lock().visible(&target) {
            Ok(target)
        } else {
            Err(ProbeError::Input {
                selector: selector.to_string(),
                message: "element is not visible".to_string(),
            })
        }
    }
}

#[async_trait]
impl PageDriver for FakeChat {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        self.record(format!("goto:{url}"));
        let mut state = self.lock();
        state.url = url.to_string();
        state.view = if state.logged_in() {
            View::Home
        } else if url.ends_with("/login/") {
            View::Login
        } else {
            View::Blank
        };
        state.compose = None;
        state.popover_for = None;
        state.editing = None;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn click(&self, selector: &str) -> ProbeResult<()> {
        self.record(format!("click:{selector}"));
        let target = self.interactable(selector)?;
        self.lock().activate(&target);
        Ok(())
    }

    async fn trigger_click(&self, selector: &str) -> ProbeResult<()> {
        self.record(format!("trigger_click:{selector}"));
        let target = self.existing(selector)?;
        self.lock().activate(&target);
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> ProbeResult<()> {
        self.record(format!("type_text:{selector}"));
        let target = self.interactable(selector)?;
        let mut state = self.lock();
        let field = state.input_mut(&target).ok_or_else(|| ProbeError::Input {
            selector: selector.to_string(),
            message: "element is not an input".to_string(),
        })?;
        field.push_str(text);
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> ProbeResult<()> {
        self.record(format!("press_key:{selector}"));
        let target = self.interactable(selector)?;
        self.lock().press(&target, key);
        Ok(())
    }

    async fn clear(&self, selector: &str) -> ProbeResult<()> {
        self.record(format!("clear:{selector}"));
        let target = self.existing(selector)?;
        let mut state = self.lock();
        let field = state
            .input_mut(&target)
            .ok_or_else(|| ProbeError::not_found(selector))?;
        field.clear();
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> ProbeResult<bool> {
        Ok(parse_target(selector).is_some_and(|t| self.lock().visible(&t)))
    }

    async fn exists(&self, selector: &str) -> ProbeResult<bool> {
        Ok(parse_target(selector).is_some_and(|t| self.lock().exists(&t)))
    }

    async fn text_content(&self, selector: &str) -> ProbeResult<Option<String>> {
        Ok(parse_target(selector).and_then(|t| self.lock().text(&t)))
    }

    async fn input_value(&self, selector: &str) -> ProbeResult<Option<String>> {
        Ok(parse_target(selector).and_then(|t| self.lock().input_value(&t)))
    }

    async fn call_function(&self, function: &PageFunction) -> ProbeResult<Value> {
        let arg = function
            .args
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut state = self.lock();
        match function.name {
            scripts::LAST_MESSAGE_ID => Ok(state.last_message_id(arg)),
            scripts::FULLY_PROCESSED_MESSAGE => Ok(state.fully_processed(arg)),
            scripts::RENDERED_MESSAGES => Ok(state.rendered_messages(arg)),
            other => Err(ProbeError::Evaluation {
                function: other.to_string(),
                message: "ReferenceError: function is not defined".to_string(),
            }),
        }
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        Ok(PNG_SIGNATURE.to_vec())
    }

    async fn close(&self) -> ProbeResult<()> {
        self.record("close".to_string());
        self.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const LOGIN_URL: &str = "http://zulip.zulipdev.com:9981/login/";

    async fn logged_in() -> FakeChat {
        let fake = FakeChat::new();
        fake.goto(LOGIN_URL).await.unwrap();
        fake.type_text(sel::LOGIN_USERNAME, "desdemona@zulip.com")
            .await
            .unwrap();
        fake.type_text(sel::LOGIN_PASSWORD, "password").await.unwrap();
        fake.trigger_click(sel::LOGIN_SUBMIT).await.unwrap();
        fake.click(sel::ALL_MESSAGES).await.unwrap();
        fake
    }

    mod selectors_tests {
        use super::*;

        #[test]
        fn test_parse_static() {
            assert_eq!(
                parse_target(sel::COMPOSE_SEND),
                Some(Target::Static(sel::COMPOSE_SEND))
            );
        }

        #[test]
        fn test_parse_row_parts() {
            let id = MessageId(9);
            assert_eq!(
                parse_target(&sel::message_row(HOME_TABLE, id)),
                Some(Target::Row(id, RowPart::Row))
            );
            assert_eq!(
                parse_target(&sel::in_row(HOME_TABLE, id, sel::ROW_ACTIONS)),
                Some(Target::Row(id, RowPart::Actions))
            );
            assert_eq!(
                parse_target(&sel::in_row(HOME_TABLE, id, sel::ROW_STATUS_SENDER)),
                Some(Target::Row(id, RowPart::StatusSender))
            );
        }

        #[test]
        fn test_parse_unknown() {
            assert_eq!(parse_target(".nope"), None);
            assert_eq!(parse_target(&sel::message_row("other", MessageId(1))), None);
            assert_eq!(
                parse_target(&sel::in_row(HOME_TABLE, MessageId(1), ".nope")),
                None
            );
        }
    }

    mod login_tests {
        use super::*;

        #[tokio::test]
        async fn test_login_with_valid_credentials() {
            let fake = logged_in().await;
            assert_eq!(fake.logged_in_user().as_deref(), Some("desdemona@zulip.com"));
            assert_eq!(
                fake.current_url().await.unwrap(),
                "http://zulip.zulipdev.com:9981/"
            );
        }

        #[tokio::test]
        async fn test_login_with_wrong_password() {
            let fake = FakeChat::new();
            fake.goto(LOGIN_URL).await.unwrap();
            fake.type_text(sel::LOGIN_USERNAME, "desdemona@zulip.com")
                .await
                .unwrap();
            fake.type_text(sel::LOGIN_PASSWORD, "wrong").await.unwrap();
            fake.click(sel::LOGIN_SUBMIT).await.unwrap();
            assert!(fake.logged_in_user().is_none());
            assert!(fake.is_visible(sel::LOGIN_FORM).await.unwrap());
        }

        #[tokio::test]
        async fn test_rejected_login_fault() {
            let fake = FakeChat::new().with_fault(FakeFault::RejectLogin);
            fake.goto(LOGIN_URL).await.unwrap();
            fake.type_text(sel::LOGIN_USERNAME, "desdemona@zulip.com")
                .await
                .unwrap();
            fake.type_text(sel::LOGIN_PASSWORD, "password").await.unwrap();
            fake.click(sel::LOGIN_SUBMIT).await.unwrap();
            assert!(fake.logged_in_user().is_none());
        }

        #[tokio::test]
        async fn test_login_inputs_absent_before_navigation() {
            let fake = FakeChat::new();
            let err = fake
                .type_text(sel::LOGIN_USERNAME, "x")
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
        }

        #[tokio::test]
        async fn test_typing_into_hidden_input_fails() {
            let fake = logged_in().await;
            assert!(fake.exists(sel::COMPOSE_TEXTAREA).await.unwrap());
            assert!(!fake.is_visible(sel::COMPOSE_TEXTAREA).await.unwrap());
            let err = fake
                .type_text(sel::COMPOSE_TEXTAREA, "x")
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::Input { .. }));
        }

        #[tokio::test]
        async fn test_closed_compose_box_reads_empty() {
            let fake = logged_in().await;
            assert_eq!(
                fake.input_value(sel::COMPOSE_TEXTAREA).await.unwrap().as_deref(),
                Some("")
            );
            assert!(fake.exists(sel::LOGGED_IN_MARKER).await.unwrap());
            assert!(!fake.is_visible(sel::LOGGED_IN_MARKER).await.unwrap());
        }
    }

    mod compose_tests {
        use super::*;

        #[tokio::test]
        async fn test_send_stream_message_echoes_locally() {
            let fake = logged_in().await;
            fake.click(sel::COMPOSE_STREAM_BUTTON).await.unwrap();
            fake.type_text(sel::COMPOSE_STREAM, "Verona").await.unwrap();
            fake.type_text(sel::COMPOSE_TOPIC, "edits").await.unwrap();
            fake.type_text(sel::COMPOSE_TEXTAREA, "hello").await.unwrap();
            fake.click(sel::COMPOSE_SEND).await.unwrap();

            let last = fake.messages().pop().unwrap();
            assert_eq!(last.content, "hello");
            assert!(!last.acked);
            assert_eq!(
                fake.input_value(sel::COMPOSE_TEXTAREA).await.unwrap().as_deref(),
                Some("")
            );

            let first = fake
                .call_function(&scripts::fully_processed_message("hello"))
                .await
                .unwrap();
            assert!(first.is_null());
            let second = fake
                .call_function(&scripts::fully_processed_message("hello"))
                .await
                .unwrap();
            assert_eq!(second, json!(last.id.0));
        }

        #[tokio::test]
        async fn test_send_without_topic_is_ignored() {
            let fake = logged_in().await;
            let before = fake.messages().len();
            fake.click(sel::COMPOSE_STREAM_BUTTON).await.unwrap();
            fake.type_text(sel::COMPOSE_STREAM, "Verona").await.unwrap();
            fake.type_text(sel::COMPOSE_TEXTAREA, "hello").await.unwrap();
            fake.click(sel::COMPOSE_SEND).await.unwrap();
            assert_eq!(fake.messages().len(), before);
        }

        #[tokio::test]
        async fn test_private_recipient_typeahead() {
            let fake = logged_in().await;
            fake.click(sel::COMPOSE_PRIVATE_BUTTON).await.unwrap();
            assert!(!fake.is_visible(sel::TYPEAHEAD_ACTIVE).await.unwrap());
            fake.type_text(sel::COMPOSE_PRIVATE_RECIPIENT, "cordelia@")
                .await
                .unwrap();
            assert_eq!(
                fake.text_content(sel::TYPEAHEAD_ACTIVE).await.unwrap().as_deref(),
                Some("Cordelia, Lear's daughter")
            );
            fake.press_key(sel::COMPOSE_PRIVATE_RECIPIENT, "Enter")
                .await
                .unwrap();
            fake.type_text(sel::COMPOSE_TEXTAREA, "hi").await.unwrap();
            fake.click(sel::COMPOSE_SEND).await.unwrap();
            let last = fake.messages().pop().unwrap();
            assert_eq!(
                last.destination,
                Destination::Private {
                    recipients: vec!["cordelia@zulip.com".into()]
                }
            );
        }
    }

    mod edit_tests {
        use super::*;

        #[tokio::test]
        async fn test_actions_control_is_hover_only() {
            let fake = logged_in().await;
            let id = fake.messages()[0].id;
            let actions = sel::in_row(HOME_TABLE, id, sel::ROW_ACTIONS);
            assert!(fake.exists(&actions).await.unwrap());
            assert!(!fake.is_visible(&actions).await.unwrap());
            assert!(fake.click(&actions).await.is_err());
            fake.trigger_click(&actions).await.unwrap();
            assert!(fake.is_visible(sel::POPOVER_EDIT_MESSAGE).await.unwrap());
        }

        #[tokio::test]
        async fn test_edit_and_save() {
            let fake = logged_in().await;
            let id = fake.messages()[1].id;
            fake.trigger_click(&sel::in_row(HOME_TABLE, id, sel::ROW_ACTIONS))
                .await
                .unwrap();
            fake.click(sel::POPOVER_EDIT_MESSAGE).await.unwrap();
            let topic = sel::in_row(HOME_TABLE, id, sel::ROW_EDIT_TOPIC);
            let content = sel::in_row(HOME_TABLE, id, sel::ROW_EDIT_CONTENT);
            assert_eq!(fake.input_value(&topic).await.unwrap().as_deref(), Some("test"));
            fake.clear(&topic).await.unwrap();
            fake.type_text(&topic, "moved").await.unwrap();
            fake.clear(&content).await.unwrap();
            fake.type_text(&content, "changed").await.unwrap();
            fake.click(&sel::in_row(HOME_TABLE, id, sel::ROW_EDIT_SAVE))
                .await
                .unwrap();

            let message = fake.message(id).unwrap();
            assert_eq!(message.content, "changed");
            assert_eq!(message.destination, Destination::stream("Verona", "moved"));
            assert!(!fake.exists(&content).await.unwrap());
        }

        #[tokio::test]
        async fn test_missing_popover_entry() {
            let fake = logged_in().await;
            let fake = fake.with_fault(FakeFault::NoEditPopover);
            let id = fake.messages()[0].id;
            fake.trigger_click(&sel::in_row(HOME_TABLE, id, sel::ROW_ACTIONS))
                .await
                .unwrap();
            assert!(!fake.is_visible(sel::POPOVER_EDIT_MESSAGE).await.unwrap());
        }

        #[tokio::test]
        async fn test_edited_me_message_loses_status_rendering() {
            let fake = FakeChat::empty()
                .with_message(
                    "desdemona@zulip.com",
                    Destination::stream("Verona", "edits"),
                    "/me waves",
                )
                .with_fault(FakeFault::DropMeRendering);
            fake.goto(LOGIN_URL).await.unwrap();
            fake.type_text(sel::LOGIN_USERNAME, "desdemona@zulip.com")
                .await
                .unwrap();
            fake.type_text(sel::LOGIN_PASSWORD, "password").await.unwrap();
            fake.click(sel::LOGIN_SUBMIT).await.unwrap();
            fake.click(sel::ALL_MESSAGES).await.unwrap();

            let id = fake.messages()[0].id;
            let status = sel::in_row(HOME_TABLE, id, sel::ROW_STATUS_MESSAGE);
            assert!(fake.exists(&status).await.unwrap());

            fake.trigger_click(&sel::in_row(HOME_TABLE, id, sel::ROW_ACTIONS))
                .await
                .unwrap();
            fake.click(sel::POPOVER_EDIT_MESSAGE).await.unwrap();
            let content = sel::in_row(HOME_TABLE, id, sel::ROW_EDIT_CONTENT);
            fake.clear(&content).await.unwrap();
            fake.type_text(&content, "/me waves again").await.unwrap();
            fake.click(&sel::in_row(HOME_TABLE, id, sel::ROW_EDIT_SAVE))
                .await
                .unwrap();

            assert_eq!(fake.message(id).unwrap().content, "/me waves again");
            assert!(!fake.exists(&status).await.unwrap());
        }

        #[tokio::test]
        async fn test_me_message_rendering() {
            let fake = FakeChat::empty().with_message(
                "desdemona@zulip.com",
                Destination::stream("Verona", "edits"),
                "/me waves",
            );
            fake.goto(LOGIN_URL).await.unwrap();
            fake.type_text(sel::LOGIN_USERNAME, "desdemona@zulip.com")
                .await
                .unwrap();
            fake.type_text(sel::LOGIN_PASSWORD, "password").await.unwrap();
            fake.click(sel::LOGIN_SUBMIT).await.unwrap();
            fake.click(sel::ALL_MESSAGES).await.unwrap();

            let id = fake.messages()[0].id;
            assert_eq!(
                fake.text_content(&sel::in_row(HOME_TABLE, id, sel::ROW_STATUS_MESSAGE))
                    .await
                    .unwrap()
                    .as_deref(),
                Some("waves")
            );
            let sender = fake
                .text_content(&sel::in_row(HOME_TABLE, id, sel::ROW_STATUS_SENDER))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(sender.trim(), "Desdemona");
        }
    }

    mod page_function_tests {
        use super::*;

        #[tokio::test]
        async fn test_rendered_messages_groups_seed() {
            let fake = logged_in().await;
            let value = fake
                .call_function(&scripts::rendered_messages(HOME_TABLE))
                .await
                .unwrap();
            let groups: Vec<MessageGroup> = serde_json::from_value(value).unwrap();
            assert_eq!(
                groups,
                vec![MessageGroup::new(
                    "Verona > test",
                    ["verona test a", "verona test b"]
                )]
            );
        }

        #[tokio::test]
        async fn test_rows_hidden_outside_all_messages() {
            let fake = FakeChat::new();
            let value = fake
                .call_function(&scripts::last_message_id(HOME_TABLE))
                .await
                .unwrap();
            assert!(value.is_null());
            assert!(!fake
                .is_visible(&sel::message_rows(HOME_TABLE))
                .await
                .unwrap());
        }

        #[tokio::test]
        async fn test_unknown_function() {
            let fake = FakeChat::new();
            let err = fake
                .call_function(&PageFunction::new("nope", "() => 1"))
                .await
                .unwrap_err();
            assert!(err.is_transient());
        }
    }

    mod grouping_tests {
        use super::*;
        use proptest::prelude::*;

        fn name(email: &str) -> String {
            email.split('@').next().unwrap_or(email).to_string()
        }

        fn message(id: u64, sender: &str, destination: Destination, content: &str) -> FakeMessage {
            FakeMessage {
                id: MessageId(id),
                sender: sender.to_string(),
                destination,
                content: content.to_string(),
                acked: true,
            }
        }

        #[test]
        fn test_private_header_names_the_other_side() {
            let messages = vec![
                message(1, "me@x", Destination::private("cordelia@x"), "out"),
                message(2, "cordelia@x", Destination::private("me@x"), "in"),
            ];
            let groups = group_messages(&messages, "me@x", name);
            assert_eq!(
                groups,
                vec![MessageGroup::new("You and cordelia", ["out", "in"])]
            );
        }

        #[test]
        fn test_group_chat_header_ignores_recipient_order() {
            let group = |recipients: [&str; 2]| Destination::Private {
                recipients: recipients.iter().map(ToString::to_string).collect(),
            };
            let messages = vec![
                message(1, "me@x", group(["a@x", "b@x"]), "one"),
                message(2, "a@x", group(["me@x", "b@x"]), "two"),
                message(3, "b@x", group(["a@x", "me@x"]), "three"),
            ];
            let groups = group_messages(&messages, "me@x", name);
            assert_eq!(
                groups,
                vec![MessageGroup::new("You and a, b", ["one", "two", "three"])]
            );
        }

        #[test]
        fn test_message_to_self_is_headed_by_own_name() {
            let messages = vec![message(1, "me@x", Destination::private("me@x"), "note")];
            let groups = group_messages(&messages, "me@x", name);
            assert_eq!(groups, vec![MessageGroup::new("You and me", ["note"])]);
        }

        #[test]
        fn test_topic_change_splits_groups() {
            let messages = vec![
                message(1, "a@x", Destination::stream("Verona", "one"), "1"),
                message(2, "a@x", Destination::stream("Verona", "two"), "2"),
                message(3, "a@x", Destination::stream("Verona", "one"), "3"),
            ];
            let headers: Vec<String> = group_messages(&messages, "a@x", name)
                .into_iter()
                .map(|g| g.header)
                .collect();
            assert_eq!(headers, ["Verona > one", "Verona > two", "Verona > one"]);
        }

        fn destination() -> impl Strategy<Value = Destination> {
            prop_oneof![
                (0..2_usize, 0..3_usize).prop_map(|(s, t)| Destination::stream(
                    ["Verona", "Denmark"][s],
                    ["a", "b", "c"][t]
                )),
                (0..2_usize).prop_map(|r| Destination::private(["cordelia@x", "hamlet@x"][r])),
            ]
        }

        proptest! {
            #[test]
            fn prop_grouping_preserves_order_and_splits_on_header_change(
                entries in proptest::collection::vec((destination(), "[a-z]{1,8}"), 0..40)
            ) {
                let messages: Vec<FakeMessage> = entries
                    .iter()
                    .enumerate()
                    .map(|(i, (d, c))| message(i as u64 + 1, "me@x", d.clone(), c))
                    .collect();
                let groups = group_messages(&messages, "me@x", name);

                let flattened: Vec<&str> = groups
                    .iter()
                    .flat_map(|g| g.bodies.iter().map(String::as_str))
                    .collect();
                let contents: Vec<&str> = entries.iter().map(|(_, c)| c.as_str()).collect();
                prop_assert_eq!(flattened, contents);

                for pair in groups.windows(2) {
                    prop_assert_ne!(&pair[0].header, &pair[1].header);
                }
                prop_assert!(groups.iter().all(|g| !g.bodies.is_empty()));
            }
        }
    }
}
