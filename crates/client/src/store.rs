//! Client state store.
//!
//! All client state lives in one [`ClientState`] value. It is only changed by dispatching an
//! [`Action`], which [`reduce`] applies. Views read snapshots through a `tokio::sync::watch`
//! channel; every dispatched action is also published on a broadcast channel so listeners can
//! follow transitions that a snapshot would coalesce.

use crate::models::{OcrAzureResult, Tooltip};
use api_shared::Receipt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

const ACTION_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub receipt: Option<Receipt>,
    pub tooltip: Option<Tooltip>,
    pub loading: bool,
    pub ocr_azure_result: Vec<OcrAzureResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetReceipt(Receipt),
    SetUploaded(bool),
    SetTooltip(Tooltip),
    ClearTooltip,
    SetLoading(bool),
    SetOcrAzureResult(Vec<OcrAzureResult>),
}

pub fn reduce(state: &mut ClientState, action: Action) {
    match action {
        Action::SetReceipt(receipt) => {
            state.receipt = Some(receipt);
            state.ocr_azure_result.clear();
        }
        Action::SetUploaded(uploaded) => {
            if let Some(receipt) = state.receipt.as_mut() {
                receipt.uploaded_to_blob_storage = uploaded;
            }
        }
        Action::SetTooltip(tooltip) => state.tooltip = Some(tooltip),
        Action::ClearTooltip => state.tooltip = None,
        Action::SetLoading(loading) => state.loading = loading,
        Action::SetOcrAzureResult(result) => state.ocr_azure_result = result,
    }
}

/// Shared handle to the client state. Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct Store {
    state: Arc<watch::Sender<ClientState>>,
    actions: broadcast::Sender<Action>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(ClientState::default())
    }
}

impl Store {
    pub fn new(initial: ClientState) -> Self {
        let (state, _) = watch::channel(initial);
        let (actions, _) = broadcast::channel(ACTION_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(state),
            actions,
        }
    }

    /// Applies `action` and publishes it. The publish happens while the state lock is held, so
    /// the action log has the same order as the state transitions.
    pub fn dispatch(&self, action: Action) {
        tracing::trace!(?action, "dispatch");
        self.state.send_modify(|state| {
            reduce(state, action.clone());
            // No subscribers is fine.
            let _ = self.actions.send(action);
        });
    }

    /// Sets `loading` unless it is already set. Returns false if another operation holds it.
    pub fn begin_loading(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            reduce(state, Action::SetLoading(true));
            let _ = self.actions.send(Action::SetLoading(true));
            true
        })
    }

    pub fn snapshot(&self) -> ClientState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    pub fn subscribe_actions(&self) -> broadcast::Receiver<Action> {
        self.actions.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TooltipId;

    fn receipt() -> Receipt {
        Receipt {
            id: "r1".into(),
            content: "data:image/jpeg;base64,/9j/4A==".into(),
            uploaded_to_blob_storage: false,
        }
    }

    #[test]
    fn reducer_sets_and_clears_tooltip() {
        let mut state = ClientState::default();
        reduce(
            &mut state,
            Action::SetTooltip(Tooltip::new(TooltipId::OcrProcessor, "x")),
        );
        assert!(state.tooltip.is_some());
        reduce(&mut state, Action::ClearTooltip);
        assert!(state.tooltip.is_none());
    }

    #[test]
    fn new_receipt_clears_previous_result() {
        let mut state = ClientState {
            ocr_azure_result: vec![OcrAzureResult {
                id: uuid::Uuid::new_v4(),
                kind: "item".into(),
                properties: Default::default(),
            }],
            ..Default::default()
        };
        reduce(&mut state, Action::SetReceipt(receipt()));
        assert!(state.ocr_azure_result.is_empty());

        reduce(&mut state, Action::SetUploaded(true));
        assert!(state.receipt.unwrap().uploaded_to_blob_storage);
    }

    #[test]
    fn begin_loading_is_exclusive() {
        let store = Store::default();
        let mut actions = store.subscribe_actions();

        assert!(store.begin_loading());
        assert!(!store.begin_loading());
        store.dispatch(Action::SetLoading(false));
        assert!(store.begin_loading());

        assert_eq!(actions.try_recv().unwrap(), Action::SetLoading(true));
        assert_eq!(actions.try_recv().unwrap(), Action::SetLoading(false));
        assert_eq!(actions.try_recv().unwrap(), Action::SetLoading(true));
        assert!(actions.try_recv().is_err());
    }

    #[test]
    fn action_log_follows_state_order_under_concurrent_dispatch() {
        let store = Store::default();
        let mut actions = store.subscribe_actions();

        let handles: Vec<_> = (0..4)
            .map(|thread| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for n in 0..10 {
                        store.dispatch(Action::SetTooltip(Tooltip::new(
                            TooltipId::OcrProcessor,
                            format!("{thread}-{n}"),
                        )));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut last = None;
        let mut count = 0;
        while let Ok(action) = actions.try_recv() {
            last = Some(action);
            count += 1;
        }
        assert_eq!(count, 40);
        assert_eq!(
            last,
            Some(Action::SetTooltip(store.snapshot().tooltip.unwrap()))
        );
    }

    #[tokio::test]
    async fn subscribers_see_latest_state() {
        let store = Store::default();
        let mut rx = store.subscribe();

        store.dispatch(Action::SetReceipt(receipt()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().receipt.as_ref().unwrap().id, "r1");
    }
}
