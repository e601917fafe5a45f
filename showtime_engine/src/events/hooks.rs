use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{BookingConfirmedEvent, EventHandler, EventProducer, Handler};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub show_booked_producer: Vec<EventProducer<BookingConfirmedEvent>>,
}

impl EventProducers {
    /// Hand the event to every subscriber. Returns the number of subscribers notified.
    pub async fn notify_show_booked(&self, event: BookingConfirmedEvent) -> usize {
        for producer in &self.show_booked_producer {
            producer.publish_event(event.clone()).await;
        }
        self.show_booked_producer.len()
    }
}

pub struct EventHandlers {
    pub on_show_booked: Option<EventHandler<BookingConfirmedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_show_booked = hooks.on_show_booked.map(|f| EventHandler::new(buffer_size, f));
        Self { on_show_booked }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_show_booked {
            result.show_booked_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_show_booked {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_show_booked: Option<Handler<BookingConfirmedEvent>>,
}

impl EventHooks {
    pub fn on_show_booked<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BookingConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_show_booked = Some(Arc::new(f));
        self
    }
}
