use crate::{
    handlers::{contact, greet, text, HandlerDeps},
    messaging::types::{Event, Payload},
};

/// Which handler an event goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Greet,
    Contact,
    Acknowledge,
    Ignore,
}

/// Classify an event. First match wins:
/// greeting command, contact share, non-empty text, everything else.
pub fn classify(event: &Event, greeting_command: &str) -> Route {
    if event.origin.is_none() {
        return Route::Ignore;
    }
    match &event.payload {
        Payload::Text(t) if t == greeting_command => Route::Greet,
        Payload::Contact(_) => Route::Contact,
        Payload::Text(t) if !t.is_empty() => Route::Acknowledge,
        _ => Route::Ignore,
    }
}

/// Routes each event to exactly one handler.
#[derive(Clone)]
pub struct Router {
    deps: HandlerDeps,
}

impl Router {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }

    /// Dispatch one event. Never fails: handlers log their own errors.
    pub async fn dispatch(&self, event: &Event) -> Route {
        let route = classify(event, &self.deps.settings.greeting_command);
        let Some(origin) = event.origin.as_ref() else {
            tracing::debug!(event_id = event.id.0, "event without message ignored");
            return route;
        };

        tracing::info!(
            event_id = event.id.0,
            chat_id = origin.chat_id.0,
            user_id = origin.user_id.0,
            name = %origin.first_name,
            ?route,
            "new message"
        );

        match (&event.payload, route) {
            (_, Route::Greet) => {
                greet::handle_greet(&self.deps, origin.chat_id, origin.user_id, &origin.first_name)
                    .await;
            }
            (Payload::Contact(c), Route::Contact) => {
                let report = contact::handle_contact(&self.deps, origin.chat_id, c).await;
                tracing::debug!(event_id = event.id.0, ?report, "registration finished");
            }
            (Payload::Text(t), Route::Acknowledge) => {
                text::handle_text(&self.deps, origin.chat_id, t).await;
            }
            _ => {
                tracing::debug!(event_id = event.id.0, "no actionable payload");
            }
        }
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventId;
    use crate::testing::{contact_event, deps, origin, text_event, FakeBackend, FakeTransport};

    #[test]
    fn classification_order() {
        assert_eq!(classify(&text_event(1, "/start"), "/start"), Route::Greet);
        assert_eq!(classify(&contact_event(2, "+1", 9), "/start"), Route::Contact);
        assert_eq!(classify(&text_event(3, "hi"), "/start"), Route::Acknowledge);
        assert_eq!(classify(&text_event(4, ""), "/start"), Route::Ignore);
        assert_eq!(
            classify(&Event::new(EventId(5), origin(1, 1), Payload::Empty), "/start"),
            Route::Ignore
        );
        assert_eq!(classify(&Event::unroutable(EventId(6)), "/start"), Route::Ignore);
    }

    #[test]
    fn greeting_match_is_exact() {
        assert_eq!(classify(&text_event(1, "/start now"), "/start"), Route::Acknowledge);
        assert_eq!(classify(&text_event(1, "/hello"), "/hello"), Route::Greet);
    }

    #[tokio::test]
    async fn each_event_fires_exactly_one_handler() {
        let transport = FakeTransport::new();
        let backend = FakeBackend::new();
        let router = Router::new(deps(&transport, &backend));

        assert_eq!(router.dispatch(&text_event(1, "/start")).await, Route::Greet);
        assert_eq!(transport.sent().len(), 1);
        assert!(transport.sent()[0].keyboard.is_some());

        assert_eq!(router.dispatch(&text_event(2, "hello")).await, Route::Acknowledge);
        assert_eq!(transport.sent().len(), 2);
        assert!(backend.records().is_empty());

        assert_eq!(
            router.dispatch(&contact_event(3, "+15550001", 77)).await,
            Route::Contact
        );
        assert_eq!(transport.sent().len(), 3);
        assert_eq!(backend.records().len(), 1);
        assert_eq!(backend.provisions().len(), 1);

        assert_eq!(router.dispatch(&Event::unroutable(EventId(4))).await, Route::Ignore);
        assert_eq!(transport.sent().len(), 3);
    }
}
