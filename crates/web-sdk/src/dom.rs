//! Document model — a parsed HTML tree plus the page location, title and a
//! document-level listener registry that delegated trackers attach to.
//!
//! The document lives on the host's event-loop thread; listeners are plain
//! `Rc` closures and are invoked synchronously by [`Document::dispatch_event`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use beacon_core::{BeaconError, BeaconResult};
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

/// Handler attached to a document for one event name.
pub type EventListener = Rc<dyn Fn(&DomEvent<'_>)>;

/// Box a closure as an [`EventListener`].
pub fn listener<F>(f: F) -> EventListener
where
    F: Fn(&DomEvent<'_>) + 'static,
{
    Rc::new(f)
}

/// Handle returned by [`Document::add_event_listener`], used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    event_type: String,
    capture: bool,
    listener: EventListener,
}

/// A DOM event as seen by a listener.
pub struct DomEvent<'a> {
    event_type: String,
    target: Option<ElementRef<'a>>,
    document: &'a Document,
}

impl<'a> DomEvent<'a> {
    pub fn new(
        event_type: impl Into<String>,
        target: Option<ElementRef<'a>>,
        document: &'a Document,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            document,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> Option<ElementRef<'a>> {
        self.target
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }
}

impl fmt::Debug for DomEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomEvent")
            .field("event_type", &self.event_type)
            .field("target", &self.target.map(|t| t.value().name().to_string()))
            .finish()
    }
}

pub struct Document {
    html: Html,
    location: RefCell<String>,
    title: RefCell<String>,
    listeners: RefCell<Vec<Registration>>,
    next_listener_id: Cell<u64>,
}

impl Document {
    /// Parse a full HTML document served from `location`. The title is taken
    /// from the first `<title>` element.
    pub fn parse(source: &str, location: impl Into<String>) -> Self {
        let html = Html::parse_document(source);
        let title = title_of(&html);
        Self {
            html,
            location: RefCell::new(location.into()),
            title: RefCell::new(title),
            listeners: RefCell::new(Vec::new()),
            next_listener_id: Cell::new(0),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn location(&self) -> String {
        self.location.borrow().clone()
    }

    pub fn set_location(&self, href: impl Into<String>) {
        *self.location.borrow_mut() = href.into();
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.borrow_mut() = title.into();
    }

    /// First element matching `selector`, in document order.
    pub fn query_selector(&self, selector: &str) -> BeaconResult<Option<ElementRef<'_>>> {
        let parsed = Selector::parse(selector)
            .map_err(|_| BeaconError::InvalidSelector(selector.to_string()))?;
        Ok(self.html.select(&parsed).next())
    }

    pub fn add_event_listener(
        &self,
        event_type: &str,
        listener: EventListener,
        capture: bool,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id.get());
        self.next_listener_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Registration {
            id,
            event_type: event_type.to_string(),
            capture,
            listener,
        });
        trace!(event_type, capture, listener = id.0, "listener added");
        id
    }

    /// Remove the listener registered under exactly (`event_type`, `id`,
    /// `capture`). Returns whether anything was removed.
    pub fn remove_event_listener(&self, event_type: &str, id: ListenerId, capture: bool) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|r| !(r.id == id && r.capture == capture && r.event_type == event_type));
        before != listeners.len()
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }

    pub fn total_listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Deliver an event to every listener for `event_type`: capture-phase
    /// listeners first, then the rest, each group in registration order.
    pub fn dispatch_event<'a>(&'a self, event_type: &str, target: Option<ElementRef<'a>>) {
        let matching: Vec<EventListener> = {
            let listeners = self.listeners.borrow();
            let (capture, bubble): (Vec<&Registration>, Vec<&Registration>) = listeners
                .iter()
                .filter(|r| r.event_type == event_type)
                .partition(|r| r.capture);
            capture
                .into_iter()
                .chain(bubble)
                .map(|r| Rc::clone(&r.listener))
                .collect()
        };

        let event = DomEvent::new(event_type, target, self);
        for listener in matching {
            listener(&event);
        }
    }

    /// Dispatch `event_type` at the first element matching `selector`.
    /// Returns `false` (and dispatches nothing) when no element matches.
    pub fn fire(&self, event_type: &str, selector: &str) -> BeaconResult<bool> {
        match self.query_selector(selector)? {
            Some(target) => {
                self.dispatch_event(event_type, Some(target));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn title_of(html: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|selector| {
            html.select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default()
}
