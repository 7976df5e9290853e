use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, ReconciliationAlertEvent, WalletCreditedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub wallet_credited_producer: Vec<EventProducer<WalletCreditedEvent>>,
    pub reconciliation_alert_producer: Vec<EventProducer<ReconciliationAlertEvent>>,
}

pub struct EventHandlers {
    pub on_wallet_credited: Option<EventHandler<WalletCreditedEvent>>,
    pub on_reconciliation_alert: Option<EventHandler<ReconciliationAlertEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_wallet_credited = hooks.on_wallet_credited.map(|f| EventHandler::new(buffer_size, f));
        let on_reconciliation_alert = hooks.on_reconciliation_alert.map(|f| EventHandler::new(buffer_size, f));
        Self { on_wallet_credited, on_reconciliation_alert }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_wallet_credited {
            result.wallet_credited_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_reconciliation_alert {
            result.reconciliation_alert_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_wallet_credited {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_reconciliation_alert {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_wallet_credited: Option<Handler<WalletCreditedEvent>>,
    pub on_reconciliation_alert: Option<Handler<ReconciliationAlertEvent>>,
}

impl EventHooks {
    pub fn on_wallet_credited<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WalletCreditedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_wallet_credited = Some(Arc::new(f));
        self
    }

    pub fn on_reconciliation_alert<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReconciliationAlertEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_reconciliation_alert = Some(Arc::new(f));
        self
    }
}
