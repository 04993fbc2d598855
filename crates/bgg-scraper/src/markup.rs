//! Narrow query interfaces over the HTML and XML parsers.

use lazy_static::lazy_static;
use select::document::Document;
use select::node::Node;
use select::predicate::{Attr, Class, Name, Predicate};
use sxd_document::{parser, Package};
use sxd_xpath::{Context, Factory, Value};

use crate::error::ExtractionError;

lazy_static! {
    static ref XP_FACTORY: Factory = Factory::new();
}

/// A parsed HTML page.
pub struct Markup(Document);

impl Markup {
    /// Parsing is lenient and never fails, malformed input yields a sparse tree.
    pub fn parse(text: &str) -> Self {
        Self(Document::from(text))
    }

    /// Every `tag` element carrying `class`, in document order.
    pub fn find_by_class(&self, tag: &str, class: &str) -> Vec<Element<'_>> {
        self.0.find(Name(tag).and(Class(class))).map(Element).collect()
    }

    /// Every `tag` element whose `attr` equals `value`, in document order.
    pub fn find_by_attr(&self, tag: &str, attr: &str, value: &str) -> Vec<Element<'_>> {
        self.0
            .find(Name(tag).and(Attr(attr, value)))
            .map(Element)
            .collect()
    }
}

#[derive(Clone, Copy)]
pub struct Element<'a>(Node<'a>);

impl<'a> Element<'a> {
    pub fn text(&self) -> String {
        self.0.text()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.attr(name)
    }
}

/// A parsed XML document queried with XPath.
pub struct XmlMarkup(Package);

impl XmlMarkup {
    pub fn parse(text: &str) -> Result<Self, ExtractionError> {
        parser::parse(text)
            .map(Self)
            .map_err(|e| ExtractionError::Document(e.to_string()))
    }

    /// String values of the nodes selected by `xpath`, in document order.
    pub fn values(&self, xpath: &str) -> Result<Vec<String>, ExtractionError> {
        let document = self.0.as_document();
        let context = Context::new();
        let compiled = XP_FACTORY
            .build(xpath)
            .map_err(|e| xpath_error(xpath, e))?
            .ok_or_else(|| xpath_error(xpath, "empty expression"))?;

        match compiled.evaluate(&context, document.root()) {
            Ok(Value::Nodeset(nodes)) => Ok(nodes
                .document_order()
                .into_iter()
                .map(|node| node.string_value())
                .collect()),
            Ok(other) => Err(xpath_error(xpath, format!("not a node-set: {other:?}"))),
            Err(e) => Err(xpath_error(xpath, e)),
        }
    }

    pub fn first_value(&self, xpath: &str) -> Result<Option<String>, ExtractionError> {
        Ok(self.values(xpath)?.into_iter().next())
    }

    /// Like [`XmlMarkup::first_value`] but a missing node is an error.
    pub fn required_value(&self, xpath: &str) -> Result<String, ExtractionError> {
        self.first_value(xpath)?
            .ok_or_else(|| ExtractionError::Missing(xpath.to_string()))
    }
}

fn xpath_error(xpath: &str, reason: impl ToString) -> ExtractionError {
    ExtractionError::XPath {
        xpath: xpath.to_string(),
        reason: reason.to_string(),
    }
}
