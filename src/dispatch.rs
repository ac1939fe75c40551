//! Conversation dispatcher.
//!
//! Each inbound event is handled on its own, in arrival order, against
//! freshly fetched tables:
//!
//! - a plain message from a registered sender gets the category keyboard;
//! - a button click from a registered sender gets the report for the chosen
//!   category, and the click is acknowledged;
//! - anything from an unregistered sender gets only the rejection notice.
//!
//! No state survives between events. The "prompt" exists only in the keyboard
//! that was sent.

use std::{thread, time::Duration};

use log::{debug, info, warn};

use crate::{
    access::check_registered,
    aggregate::{CategorySet, aggregate_by_category, list_categories},
    error::{InventoryError, InventoryResult},
    source::{RawTable, SheetLocation, TabularSource},
    telegram::{ChatTransport, InboundEvent, Keyboard, KeyboardButton, OutboundMessage},
};

pub const REJECTION_NOTICE: &str = "⛔ Siz ro'yxatdan o'tmagansiz.";
pub const CATEGORY_PROMPT: &str = "Mahsulot Kategoriyasini tanlang:";
pub const CALLBACK_ACK_NOTICE: &str = "✅";

pub fn failure_notice(err: &InventoryError) -> String {
    format!("Xatolik: {err}")
}

/// One button per row, label and payload both the category text.
pub fn category_keyboard(categories: &CategorySet) -> Keyboard {
    categories
        .iter()
        .map(|category| vec![KeyboardButton::new(category.as_str(), category.as_str())])
        .collect()
}

/// What happened to a single inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Rejected,
    CategoriesOffered(usize),
    ReportDelivered,
    Failed(String),
}

pub struct Dispatcher<S, C> {
    source: S,
    transport: C,
    location: SheetLocation,
    retry_delay: Duration,
}

impl<S, C> Dispatcher<S, C>
where
    S: TabularSource,
    C: ChatTransport,
{
    pub fn new(source: S, transport: C, location: SheetLocation) -> Self {
        Self {
            source,
            transport,
            location,
            retry_delay: Duration::from_secs(3),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    pub fn handle_event(&self, event: &InboundEvent) -> EventOutcome {
        debug!("Handling {event:?}");
        let registered = event
            .sender()
            .is_some_and(|sender| check_registered(&self.source, &self.location, sender));
        if !registered {
            info!(
                "Rejecting unregistered sender {:?} in chat {}",
                event.sender(),
                event.chat_id()
            );
            self.deliver(OutboundMessage::text(event.chat_id(), REJECTION_NOTICE));
            return EventOutcome::Rejected;
        }

        let table = self.source.fetch_location(&self.location);
        match event {
            InboundEvent::TextMessage { chat_id, .. } => self.offer_categories(*chat_id, table),
            InboundEvent::Callback {
                chat_id,
                event_id,
                payload,
                ..
            } => {
                let outcome = self.deliver_report(*chat_id, payload, table);
                if let Err(err) = self.transport.acknowledge(event_id, CALLBACK_ACK_NOTICE) {
                    warn!("Failed to acknowledge callback {event_id}: {err}");
                }
                outcome
            }
        }
    }

    fn offer_categories(&self, chat_id: i64, table: InventoryResult<RawTable>) -> EventOutcome {
        match table.and_then(|table| list_categories(&table)) {
            Ok(categories) => {
                let message = OutboundMessage::text(chat_id, CATEGORY_PROMPT)
                    .with_keyboard(category_keyboard(&categories));
                self.deliver(message);
                EventOutcome::CategoriesOffered(categories.len())
            }
            Err(err) => self.fail(chat_id, &err),
        }
    }

    fn deliver_report(
        &self,
        chat_id: i64,
        category: &str,
        table: InventoryResult<RawTable>,
    ) -> EventOutcome {
        match table.and_then(|table| aggregate_by_category(&table, category)) {
            Ok(report) => {
                self.deliver(OutboundMessage::text(chat_id, report).markdown());
                EventOutcome::ReportDelivered
            }
            Err(err) => self.fail(chat_id, &err),
        }
    }

    fn fail(&self, chat_id: i64, err: &InventoryError) -> EventOutcome {
        warn!("Query for chat {chat_id} failed: {err}");
        self.deliver(OutboundMessage::text(chat_id, failure_notice(err)));
        EventOutcome::Failed(err.to_string())
    }

    fn deliver(&self, message: OutboundMessage) {
        if let Err(err) = self.transport.send(&message) {
            warn!("Failed to send message to chat {}: {err}", message.chat_id);
        }
    }

    /// Polls once and handles every returned event in order.
    pub fn run_once(&mut self) -> InventoryResult<Vec<EventOutcome>> {
        let events = self.transport.poll()?;
        Ok(events
            .iter()
            .map(|event| self.handle_event(event))
            .collect())
    }

    /// Runs until the process is stopped. Poll failures are retried after
    /// the configured delay.
    pub fn run(&mut self) {
        loop {
            if let Err(err) = self.run_once() {
                warn!(
                    "Polling for updates failed: {err}; retrying in {}s",
                    self.retry_delay.as_secs()
                );
                thread::sleep(self.retry_delay);
            }
        }
    }
}
