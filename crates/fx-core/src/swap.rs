//! Swap strategies.
//!
//! The `fx-swap` token is resolved into a tagged strategy once, at
//! config build time, so application never re-parses strings. Unknown
//! tokens still parse (as a property write) and surface as an invalid
//! swap error only when applied, which keeps the failure on the normal
//! error path of a running request.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use fx_dom::{Document, DomError, InsertPosition, NodeId};

use crate::error::FxError;
use crate::events::SharedConfig;

/// Custom swap logic, installed by a config listener.
pub type SwapFn = Rc<dyn Fn(&mut Document, NodeId, &str) -> Result<(), FxError>>;

/// How response text lands in the document.
#[derive(Clone)]
pub enum SwapStrategy {
    /// Replace the target's children with the parsed fragment.
    InnerHtml,
    /// Replace the target itself with the parsed fragment.
    OuterHtml,
    /// Insert the parsed fragment adjacent to the target.
    Position(InsertPosition),
    /// Write the raw text through a dotted property path, creating
    /// intermediate maps as needed.
    Path(String),
    /// Write the raw text to a single named property, which must
    /// already exist on the target.
    Property(String),
    /// Run arbitrary swap logic.
    Function(SwapFn),
}

impl SwapStrategy {
    /// Resolves an `fx-swap` token. Positional keywords win, then the
    /// two HTML strategies, then dotted paths; anything else is a
    /// property write.
    pub fn parse(token: &str) -> Self {
        if let Some(position) = InsertPosition::parse(token) {
            return Self::Position(position);
        }
        match token {
            "innerHTML" => Self::InnerHtml,
            "outerHTML" => Self::OuterHtml,
            _ if token.contains('.') => Self::Path(token.to_string()),
            _ => Self::Property(token.to_string()),
        }
    }

    /// Applies this strategy to `target` with the response `text`.
    pub fn apply(&self, doc: &mut Document, target: NodeId, text: &str) -> Result<(), FxError> {
        match self {
            Self::InnerHtml => {
                let nodes = fx_html::parse_fragment(doc, text);
                doc.set_children(target, nodes)?;
                Ok(())
            }
            Self::OuterHtml => {
                let nodes = fx_html::parse_fragment(doc, text);
                doc.replace_with(target, nodes)?;
                Ok(())
            }
            Self::Position(position) => {
                let nodes = fx_html::parse_fragment(doc, text);
                doc.insert_adjacent(target, *position, nodes)?;
                Ok(())
            }
            Self::Path(path) => {
                doc.set_property_path(target, path, text)?;
                Ok(())
            }
            Self::Property(name) => doc.set_property(target, name, text).map_err(|err| {
                match err {
                    DomError::UnknownProperty(prop) => FxError::InvalidSwap(prop),
                    other => FxError::Dom(other),
                }
            }),
            Self::Function(run) => run(doc, target, text),
        }
    }
}

impl fmt::Debug for SwapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InnerHtml => write!(f, "InnerHtml"),
            Self::OuterHtml => write!(f, "OuterHtml"),
            Self::Position(position) => f.debug_tuple("Position").field(position).finish(),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Property(name) => f.debug_tuple("Property").field(name).finish(),
            Self::Function(_) => write!(f, "Function(..)"),
        }
    }
}

/// Runs the configured swap, wrapped in the transition mechanism when
/// one is set.
///
/// A mechanism failure before the swap has run falls back to a direct
/// swap; a failure after the swap ran is the swap's own error and
/// propagates.
pub(crate) async fn apply_swap(
    document: &RefCell<Document>,
    cfg: &SharedConfig,
) -> Result<(), FxError> {
    let (strategy, target, text, mechanism) = {
        let cfg = cfg.borrow();
        (
            cfg.swap.clone(),
            cfg.target,
            cfg.text.clone().unwrap_or_default(),
            cfg.transition.clone(),
        )
    };

    let ran = Cell::new(false);
    let mut op = || -> Result<(), FxError> {
        ran.set(true);
        strategy.apply(&mut document.borrow_mut(), target, &text)
    };

    match mechanism {
        Some(mechanism) => match mechanism.run(&mut op).await {
            Ok(()) => Ok(()),
            Err(err) if !ran.get() => {
                tracing::warn!("transition failed before swapping, swapping directly: {err}");
                op()
            }
            Err(err) => Err(err),
        },
        None => op(),
    }
}
