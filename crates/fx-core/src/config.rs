//! Per-invocation request configuration.
//!
//! Built once per trigger, then shared read-mostly between the
//! executor, the tracker and event listeners. The request-defining
//! fields (action, method, target, swap, body) are settled at build
//! time; execution only appends response, text and error.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use fx_dom::{Document, NodeId};
use fx_net::{AbortController, AbortSignal, FetchHandler, FetchResponse, Method};

use crate::attributes::parse_attributes;
use crate::error::FxError;
use crate::events::TriggerEvent;
use crate::mechanism::SwapMechanism;
use crate::swap::SwapStrategy;

/// Header present on every request the engine issues.
pub const FX_REQUEST_HEADER: (&str, &str) = ("FX-Request", "true");

/// Ordered form fields captured at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    fields: Vec<(String, String)>,
}

impl FormBody {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// A body with one field, for named non-form elements.
    pub fn single(name: &str, value: &str) -> Self {
        Self {
            fields: vec![(name.to_string(), value.to_string())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// `application/x-www-form-urlencoded` encoding.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.fields {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }

    /// Folds the fields into `url`'s query string, appending with `?`
    /// or `&` as appropriate.
    pub fn append_to_url(&self, url: &str) -> String {
        if self.fields.is_empty() {
            return url.to_string();
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", url, separator, self.encode())
    }
}

/// Asked between `config` and `before`; a `false` answer abandons the
/// request without an error.
#[async_trait(?Send)]
pub trait ConfirmHook {
    async fn confirm(&self) -> bool;
}

/// Everything one triggered request needs to run.
pub struct RequestConfig {
    /// The host event that started this request.
    pub trigger: TriggerEvent,
    pub action: String,
    pub method: Method,
    /// Resolved at build time and never re-resolved.
    pub target: NodeId,
    pub swap: SwapStrategy,
    pub body: Option<FormBody>,
    /// In-flight count for this element at build time; non-zero means
    /// the drop policy suppresses this request.
    pub drop: usize,
    pub headers: Vec<(String, String)>,
    /// Whether a config veto also suppresses the trigger's native
    /// default action. Listeners may clear it.
    pub prevent_trigger: bool,
    /// Transition wrapper for the swap, if any.
    pub transition: Option<Rc<dyn SwapMechanism>>,
    pub fetch: Rc<dyn FetchHandler>,
    pub confirm: Option<Rc<dyn ConfirmHook>>,
    /// Populated during execution.
    pub response: Option<FetchResponse>,
    pub text: Option<String>,
    pub error: Option<FxError>,
    abort: AbortController,
}

impl RequestConfig {
    /// Cancels this request's in-flight fetch, if any.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// The signal threaded into the fetch.
    pub fn signal(&self) -> AbortSignal {
        self.abort.signal()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("trigger", &self.trigger.name())
            .field("action", &self.action)
            .field("method", &self.method)
            .field("target", &self.target)
            .field("swap", &self.swap)
            .field("drop", &self.drop)
            .field("prevent_trigger", &self.prevent_trigger)
            .field("aborted", &self.signal().is_aborted())
            .finish_non_exhaustive()
    }
}

/// Builds the config for one trigger on `element`.
///
/// Form resolution, body capture, GET/DELETE query folding and target
/// resolution all happen here, against the document as it is right
/// now. The drop counter starts at zero; the executor stamps it from
/// the tracker.
pub(crate) fn build_config(
    doc: &Document,
    element: NodeId,
    event: &TriggerEvent,
    fetch: Rc<dyn FetchHandler>,
    transition: Option<Rc<dyn SwapMechanism>>,
    default_headers: &[(String, String)],
) -> RequestConfig {
    let parsed = parse_attributes(doc, element);

    let body = match doc.form_owner(element) {
        Some(form) => Some(FormBody::new(doc.collect_form_data(form, event.submitter()))),
        None => doc
            .attribute(element, "name")
            .filter(|n| !n.is_empty())
            .map(|name| FormBody::single(name, doc.attribute(element, "value").unwrap_or(""))),
    };

    // GET and DELETE fold their data into the query string and must
    // never carry a body.
    let (action, body) = if parsed.method.carries_body() {
        (parsed.action, body)
    } else {
        match body {
            Some(b) => (b.append_to_url(&parsed.action), None),
            None => (parsed.action, None),
        }
    };

    let target = parsed
        .target
        .as_deref()
        .and_then(|selector| doc.query_selector(selector))
        .unwrap_or(element);

    let mut headers = vec![(FX_REQUEST_HEADER.0.to_string(), FX_REQUEST_HEADER.1.to_string())];
    headers.extend(default_headers.iter().cloned());
    if body.is_some() {
        headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));
    }

    tracing::debug!(
        "built config: {} {} target {:?} trigger {}",
        parsed.method,
        action,
        target,
        event.name()
    );

    RequestConfig {
        trigger: event.clone(),
        action,
        method: parsed.method,
        target,
        swap: parsed.swap,
        body,
        drop: 0,
        headers,
        prevent_trigger: true,
        transition,
        fetch,
        confirm: None,
        response: None,
        text: None,
        error: None,
        abort: AbortController::new(),
    }
}
