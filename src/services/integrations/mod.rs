//! Headless controller behind the "remove app" button on the integrations
//! screen: a trigger, a confirmation dialog, and one delete call per
//! confirmation.

pub mod http;

use async_trait::async_trait;

pub const DIALOG_TITLE: &str = "Remove app";
pub const DIALOG_DESCRIPTION: &str = "Are you sure you want to remove this app?";
pub const DIALOG_ACTION: &str = "Yes, remove app";
pub const DELETED_MESSAGE: &str = "Integration deleted successfully";
pub const DELETE_FAILED_MESSAGE: &str = "Error deleting app";

#[async_trait]
pub trait CredentialClient: Send + Sync {
    async fn delete_credential(&self, id: i64) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, kind: ToastKind);
}

/// Writes toasts to the log; used where there is no UI to show them in.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, message: &str, kind: ToastKind) {
        match kind {
            ToastKind::Success => tracing::info!(toast = message, "integration toast"),
            ToastKind::Error => tracing::warn!(toast = message, "integration toast"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonColor {
    Primary,
    Secondary,
    Minimal,
    Destructive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonIcon {
    Trash,
}

/// Visual overrides for the trigger button.
#[derive(Debug, Clone, Default)]
pub struct ButtonProps {
    pub color: Option<ButtonColor>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct DisconnectOptions {
    pub label: Option<String>,
    pub trash_icon: bool,
    /// Globally provisioned integrations cannot be removed by the user.
    pub is_global: bool,
    pub button_props: ButtonProps,
}

/// What the trigger button should look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerView {
    pub label: Option<String>,
    pub color: ButtonColor,
    pub start_icon: Option<ButtonIcon>,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogView {
    pub title: &'static str,
    pub description: &'static str,
    pub action_text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    Deleted,
    Failed,
}

pub struct DisconnectIntegration<C, N> {
    credential_id: i64,
    options: DisconnectOptions,
    state: DialogState,
    client: C,
    notifier: N,
}

impl<C: CredentialClient, N: Notifier> DisconnectIntegration<C, N> {
    pub fn new(credential_id: i64, options: DisconnectOptions, client: C, notifier: N) -> anyhow::Result<Self> {
        anyhow::ensure!(credential_id > 0, "credential id must be positive, got {credential_id}");
        Ok(Self {
            credential_id,
            options,
            state: DialogState::Closed,
            client,
            notifier,
        })
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    /// Explicit button overrides win over the defaults, including `disabled`.
    pub fn trigger(&self) -> TriggerView {
        let props = &self.options.button_props;
        TriggerView {
            label: self.options.label.clone(),
            color: props.color.unwrap_or(ButtonColor::Destructive),
            start_icon: self.options.trash_icon.then_some(ButtonIcon::Trash),
            disabled: props.disabled.unwrap_or(self.options.is_global),
        }
    }

    /// Confirmation dialog contents, present only while it is open.
    pub fn dialog(&self) -> Option<DialogView> {
        (self.state == DialogState::Open).then_some(DialogView {
            title: DIALOG_TITLE,
            description: DIALOG_DESCRIPTION,
            action_text: DIALOG_ACTION,
        })
    }

    /// Trigger clicked. A disabled trigger leaves the dialog closed.
    pub fn open(&mut self) -> DialogState {
        if !self.trigger().disabled {
            self.state = DialogState::Open;
        }
        self.state
    }

    pub fn cancel(&mut self) {
        self.state = DialogState::Closed;
    }

    /// Confirm button in the dialog. Issues exactly one delete and closes the
    /// dialog whatever the result. Returns `None` if the dialog was not open.
    pub async fn confirm(&mut self) -> Option<DisconnectOutcome> {
        if self.state != DialogState::Open {
            return None;
        }

        let outcome = match self.client.delete_credential(self.credential_id).await {
            Ok(()) => {
                tracing::info!(credential_id = self.credential_id, "integration removed");
                self.notifier.show(DELETED_MESSAGE, ToastKind::Success);
                DisconnectOutcome::Deleted
            }
            Err(e) => {
                tracing::warn!(credential_id = self.credential_id, error = %e, "failed to remove integration");
                self.notifier.show(DELETE_FAILED_MESSAGE, ToastKind::Error);
                DisconnectOutcome::Failed
            }
        };

        self.state = DialogState::Closed;
        Some(outcome)
    }
}
